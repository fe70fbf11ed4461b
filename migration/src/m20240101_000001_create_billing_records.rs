use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BillingRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BillingRecords::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()".to_string()),
                    )
                    .col(ColumnDef::new(BillingRecords::WorkspaceId).uuid().not_null().unique_key())
                    .col(ColumnDef::new(BillingRecords::CreditBalance).big_integer().not_null().default(0))
                    .col(ColumnDef::new(BillingRecords::CreditLimit).big_integer())
                    .col(ColumnDef::new(BillingRecords::AutoRecharge).boolean().not_null().default(false))
                    .col(ColumnDef::new(BillingRecords::AutoRechargeThreshold).big_integer())
                    .col(ColumnDef::new(BillingRecords::AutoRechargeAmount).big_integer())
                    .col(ColumnDef::new(BillingRecords::CreatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .col(ColumnDef::new(BillingRecords::UpdatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BillingRecords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum BillingRecords {
    Table,
    Id,
    WorkspaceId,
    CreditBalance,
    CreditLimit,
    AutoRecharge,
    AutoRechargeThreshold,
    AutoRechargeAmount,
    CreatedAt,
    UpdatedAt,
}
