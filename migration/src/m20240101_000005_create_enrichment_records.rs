use sea_orm_migration::prelude::*;

use super::m20240101_000004_create_enrichment_jobs::EnrichmentJobs;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EnrichmentRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EnrichmentRecords::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()".to_string()),
                    )
                    .col(ColumnDef::new(EnrichmentRecords::JobId).uuid().not_null())
                    .col(ColumnDef::new(EnrichmentRecords::WorkspaceId).uuid().not_null())
                    .col(ColumnDef::new(EnrichmentRecords::RecordIndex).integer().not_null())
                    .col(ColumnDef::new(EnrichmentRecords::FieldName).string().not_null())
                    .col(ColumnDef::new(EnrichmentRecords::InputData).json().not_null())
                    .col(ColumnDef::new(EnrichmentRecords::OutputData).json())
                    .col(ColumnDef::new(EnrichmentRecords::ProviderSlug).string())
                    .col(ColumnDef::new(EnrichmentRecords::CreditsConsumed).big_integer().not_null().default(0))
                    .col(ColumnDef::new(EnrichmentRecords::Status).string().not_null())
                    .col(ColumnDef::new(EnrichmentRecords::ErrorReason).text())
                    .col(ColumnDef::new(EnrichmentRecords::IdempotencyKey).string().not_null().unique_key())
                    .col(ColumnDef::new(EnrichmentRecords::CreditTransactionId).uuid())
                    .col(ColumnDef::new(EnrichmentRecords::CreatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .col(ColumnDef::new(EnrichmentRecords::UpdatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrichment_records_job_id")
                            .from(EnrichmentRecords::Table, EnrichmentRecords::JobId)
                            .to(EnrichmentJobs::Table, EnrichmentJobs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_enrichment_records_job_id")
                    .table(EnrichmentRecords::Table)
                    .col(EnrichmentRecords::JobId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_enrichment_records_workspace_id")
                    .table(EnrichmentRecords::Table)
                    .col(EnrichmentRecords::WorkspaceId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EnrichmentRecords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum EnrichmentRecords {
    Table,
    Id,
    JobId,
    WorkspaceId,
    RecordIndex,
    FieldName,
    InputData,
    OutputData,
    ProviderSlug,
    CreditsConsumed,
    Status,
    ErrorReason,
    IdempotencyKey,
    CreditTransactionId,
    CreatedAt,
    UpdatedAt,
}
