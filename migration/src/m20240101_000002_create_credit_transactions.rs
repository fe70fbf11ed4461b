use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CreditTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CreditTransactions::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()".to_string()),
                    )
                    .col(ColumnDef::new(CreditTransactions::WorkspaceId).uuid().not_null())
                    .col(ColumnDef::new(CreditTransactions::Amount).big_integer().not_null())
                    .col(ColumnDef::new(CreditTransactions::TransactionType).string().not_null())
                    .col(ColumnDef::new(CreditTransactions::Description).text().not_null())
                    .col(ColumnDef::new(CreditTransactions::ReferenceId).uuid())
                    .col(ColumnDef::new(CreditTransactions::CreatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_credit_transactions_workspace_created")
                    .table(CreditTransactions::Table)
                    .col(CreditTransactions::WorkspaceId)
                    .col(CreditTransactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_credit_transactions_reference_id")
                    .table(CreditTransactions::Table)
                    .col(CreditTransactions::ReferenceId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CreditTransactions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CreditTransactions {
    Table,
    Id,
    WorkspaceId,
    Amount,
    TransactionType,
    Description,
    ReferenceId,
    CreatedAt,
}
