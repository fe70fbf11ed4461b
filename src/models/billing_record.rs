use loco_rs::prelude::*;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::_entities::{billing_records, prelude::*};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingRecord {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub credit_balance: i64,
    pub credit_limit: Option<i64>,
    pub auto_recharge: bool,
    pub auto_recharge_threshold: Option<i64>,
    pub auto_recharge_amount: Option<i64>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl From<billing_records::Model> for BillingRecord {
    fn from(model: billing_records::Model) -> Self {
        Self {
            id: model.id,
            workspace_id: model.workspace_id,
            credit_balance: model.credit_balance,
            credit_limit: model.credit_limit,
            auto_recharge: model.auto_recharge,
            auto_recharge_threshold: model.auto_recharge_threshold,
            auto_recharge_amount: model.auto_recharge_amount,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl BillingRecord {
    /// Find the billing row for a workspace, creating a zero-balance one if absent.
    pub async fn find_or_create(db: &DatabaseConnection, workspace_id: Uuid) -> Result<BillingRecord> {
        if let Some(existing) = Self::find_by_workspace(db, workspace_id).await? {
            return Ok(existing);
        }

        let record = billing_records::ActiveModel {
            id: Set(Uuid::new_v4()),
            workspace_id: Set(workspace_id),
            credit_balance: Set(0),
            credit_limit: Set(None),
            auto_recharge: Set(false),
            auto_recharge_threshold: Set(None),
            auto_recharge_amount: Set(None),
            created_at: Set(chrono::Utc::now().naive_utc()),
            updated_at: Set(chrono::Utc::now().naive_utc()),
        };

        let created = record.insert(db).await?;
        Ok(BillingRecord::from(created))
    }

    pub async fn find_by_workspace(db: &DatabaseConnection, workspace_id: Uuid) -> Result<Option<BillingRecord>> {
        let record = BillingRecords::find()
            .filter(billing_records::Column::WorkspaceId.eq(workspace_id))
            .one(db)
            .await?;

        Ok(record.map(BillingRecord::from))
    }

    /// Row-locks the billing record for the duration of the caller's transaction. Must be
    /// called with a `DatabaseTransaction`, never the pooled connection directly.
    pub async fn lock_for_update(
        db: &DatabaseTransaction,
        workspace_id: Uuid,
    ) -> Result<Option<BillingRecord>> {
        let record = BillingRecords::find()
            .filter(billing_records::Column::WorkspaceId.eq(workspace_id))
            .lock(sea_orm::query::LockType::Update)
            .one(db)
            .await?;

        Ok(record.map(BillingRecord::from))
    }

    /// Adds `delta` (negative for a debit) to the balance. Callers must hold the row lock
    /// acquired by `lock_for_update` within the same transaction.
    pub async fn apply_delta(db: &DatabaseTransaction, id: Uuid, delta: i64) -> Result<BillingRecord> {
        let record = BillingRecords::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Billing record not found"))?;

        let new_balance = record.credit_balance + delta;
        let mut active: billing_records::ActiveModel = record.into();
        active.credit_balance = Set(new_balance);
        active.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = active.update(db).await?;
        Ok(BillingRecord::from(updated))
    }
}
