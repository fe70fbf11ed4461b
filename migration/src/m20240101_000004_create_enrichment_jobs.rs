use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EnrichmentJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EnrichmentJobs::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()".to_string()),
                    )
                    .col(ColumnDef::new(EnrichmentJobs::WorkspaceId).uuid().not_null())
                    .col(ColumnDef::new(EnrichmentJobs::Status).string().not_null().default("pending"))
                    .col(ColumnDef::new(EnrichmentJobs::RequestedFields).json().not_null())
                    .col(ColumnDef::new(EnrichmentJobs::WaterfallConfig).json())
                    .col(ColumnDef::new(EnrichmentJobs::TotalRecords).integer().not_null())
                    .col(ColumnDef::new(EnrichmentJobs::CompletedRecords).integer().not_null().default(0))
                    .col(ColumnDef::new(EnrichmentJobs::FailedRecords).integer().not_null().default(0))
                    .col(ColumnDef::new(EnrichmentJobs::EstimatedCredits).big_integer().not_null())
                    .col(ColumnDef::new(EnrichmentJobs::CreatedBy).uuid().not_null())
                    .col(ColumnDef::new(EnrichmentJobs::CreatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .col(ColumnDef::new(EnrichmentJobs::UpdatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .col(ColumnDef::new(EnrichmentJobs::CompletedAt).timestamp())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_enrichment_jobs_workspace_id")
                    .table(EnrichmentJobs::Table)
                    .col(EnrichmentJobs::WorkspaceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_enrichment_jobs_status")
                    .table(EnrichmentJobs::Table)
                    .col(EnrichmentJobs::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EnrichmentJobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum EnrichmentJobs {
    Table,
    Id,
    WorkspaceId,
    Status,
    RequestedFields,
    WaterfallConfig,
    TotalRecords,
    CompletedRecords,
    FailedRecords,
    EstimatedCredits,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
    CompletedAt,
}
