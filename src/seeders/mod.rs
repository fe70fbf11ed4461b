use loco_rs::prelude::*;
use sea_orm::*;
use uuid::Uuid;

use crate::models::_entities::prelude::*;
use crate::models::billing_record::BillingRecord;
use crate::models::enrichment_job::EnrichmentJob;
use crate::services::config_service::ConfigService;
use crate::services::credential_vault::CredentialVault;

pub struct DatabaseSeeder;

impl DatabaseSeeder {
    /// Seed the database with a sample workspace: a credential, a funded billing record and a
    /// pending job, enough to poke the API against without wiring up a real provider.
    pub async fn seed_development(db: &DatabaseConnection) -> Result<()> {
        tracing::info!("starting development database seeding");

        let workspace_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        BillingRecord::find_or_create(db, workspace_id).await?;
        if let Some(record) = BillingRecord::find_by_workspace(db, workspace_id).await? {
            let txn = db.begin().await?;
            BillingRecord::apply_delta(&txn, record.id, 10_000).await?;
            txn.commit().await?;
        }

        if let Ok(master_key) = ConfigService::master_encryption_key() {
            if let Ok(vault) = CredentialVault::new(&master_key) {
                vault
                    .store(db, workspace_id, "clearbit", "demo-key-id", "demo-secret-value", user_id)
                    .await?;
            } else {
                tracing::warn!("MASTER_ENCRYPTION_KEY is not 32 bytes, skipping credential seed");
            }
        } else {
            tracing::warn!("MASTER_ENCRYPTION_KEY not set, skipping credential seed");
        }

        EnrichmentJob::create(
            db,
            workspace_id,
            serde_json::json!(["company_name", "employee_count"]),
            None,
            3,
            30,
            user_id,
        )
        .await?;

        tracing::info!(workspace_id = %workspace_id, "development database seeding completed");
        Ok(())
    }

    pub async fn is_seeded(db: &DatabaseConnection) -> Result<bool> {
        let count = BillingRecords::find().count(db).await?;
        Ok(count > 0)
    }

    /// Clear all seeded data (for testing). Children before parents, mirroring delivery order.
    pub async fn clear_all(db: &DatabaseConnection) -> Result<()> {
        tracing::warn!("clearing all database data");

        EnrichmentRecords::delete_many().exec(db).await?;
        EnrichmentJobs::delete_many().exec(db).await?;
        CreditTransactions::delete_many().exec(db).await?;
        WebhookSubscriptions::delete_many().exec(db).await?;
        ApiCredentials::delete_many().exec(db).await?;
        BillingRecords::delete_many().exec(db).await?;

        tracing::info!("all database data cleared");
        Ok(())
    }
}
