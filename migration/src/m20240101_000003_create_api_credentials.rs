use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ApiCredentials::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApiCredentials::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()".to_string()),
                    )
                    .col(ColumnDef::new(ApiCredentials::WorkspaceId).uuid().not_null())
                    .col(ColumnDef::new(ApiCredentials::ProviderName).string().not_null())
                    .col(ColumnDef::new(ApiCredentials::EncryptedKey).text().not_null())
                    .col(ColumnDef::new(ApiCredentials::EncryptedSecret).text().not_null())
                    .col(ColumnDef::new(ApiCredentials::Iv).string().not_null())
                    .col(ColumnDef::new(ApiCredentials::AuthTag).string().not_null())
                    .col(ColumnDef::new(ApiCredentials::CreatedBy).uuid().not_null())
                    .col(ColumnDef::new(ApiCredentials::CreatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .col(ColumnDef::new(ApiCredentials::LastUsedAt).timestamp())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_api_credentials_workspace_provider")
                    .table(ApiCredentials::Table)
                    .col(ApiCredentials::WorkspaceId)
                    .col(ApiCredentials::ProviderName)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ApiCredentials::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ApiCredentials {
    Table,
    Id,
    WorkspaceId,
    ProviderName,
    EncryptedKey,
    EncryptedSecret,
    Iv,
    AuthTag,
    CreatedBy,
    CreatedAt,
    LastUsedAt,
}
