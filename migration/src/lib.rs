pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_billing_records;
mod m20240101_000002_create_credit_transactions;
mod m20240101_000003_create_api_credentials;
mod m20240101_000004_create_enrichment_jobs;
mod m20240101_000005_create_enrichment_records;
mod m20240101_000006_create_webhook_subscriptions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_billing_records::Migration),
            Box::new(m20240101_000002_create_credit_transactions::Migration),
            Box::new(m20240101_000003_create_api_credentials::Migration),
            Box::new(m20240101_000004_create_enrichment_jobs::Migration),
            Box::new(m20240101_000005_create_enrichment_records::Migration),
            Box::new(m20240101_000006_create_webhook_subscriptions::Migration),
        ]
    }
}
