use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WebhookSubscriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WebhookSubscriptions::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()".to_string()),
                    )
                    .col(ColumnDef::new(WebhookSubscriptions::WorkspaceId).uuid().not_null())
                    .col(ColumnDef::new(WebhookSubscriptions::CallbackUrl).text().not_null())
                    .col(ColumnDef::new(WebhookSubscriptions::EventTypes).json().not_null())
                    .col(ColumnDef::new(WebhookSubscriptions::SecretKey).string().not_null())
                    .col(ColumnDef::new(WebhookSubscriptions::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(WebhookSubscriptions::CreatedBy).uuid().not_null())
                    .col(ColumnDef::new(WebhookSubscriptions::CreatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .col(ColumnDef::new(WebhookSubscriptions::UpdatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_webhook_subscriptions_workspace_id")
                    .table(WebhookSubscriptions::Table)
                    .col(WebhookSubscriptions::WorkspaceId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WebhookSubscriptions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum WebhookSubscriptions {
    Table,
    Id,
    WorkspaceId,
    CallbackUrl,
    EventTypes,
    SecretKey,
    IsActive,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}
