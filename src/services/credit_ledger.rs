use loco_rs::prelude::*;
use sea_orm::{DatabaseConnection, TransactionTrait};
use uuid::Uuid;

use crate::models::billing_record::BillingRecord;
use crate::models::credit_transaction::{CreditTransaction, TransactionType};
use crate::services::errors::LedgerError;

/// ACID balance mutation over `billing_records` + append-only `credit_transactions`. Every
/// mutation row-locks the billing record for the lifetime of a single transaction; two
/// concurrent debits on the same workspace serialize rather than race.
pub struct CreditLedger;

impl CreditLedger {
    pub async fn add_credits(
        db: &DatabaseConnection,
        workspace_id: Uuid,
        amount: i64,
        description: impl Into<String>,
    ) -> Result<CreditTransaction, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::NonPositiveAmount);
        }

        let description = description.into();
        let txn = db.begin().await?;

        let billing = BillingRecord::lock_for_update(&txn, workspace_id)
            .await
            .map_err(|_| LedgerError::NotFound)?
            .ok_or(LedgerError::NotFound)?;

        BillingRecord::apply_delta(&txn, billing.id, amount).await.map_err(|_| LedgerError::NotFound)?;

        let entry = CreditTransaction::append(
            &txn,
            workspace_id,
            amount,
            TransactionType::Purchase,
            description,
            None,
        )
        .await
        .map_err(|_| LedgerError::NotFound)?;

        txn.commit().await?;
        Ok(entry)
    }

    /// Debits `amount` from the workspace balance, triggering auto-recharge when the
    /// post-debit balance falls below the configured threshold. Returns the usage entry;
    /// the auto-recharge purchase entry (if any) is not returned but is committed atomically
    /// alongside it.
    pub async fn debit(
        db: &DatabaseConnection,
        workspace_id: Uuid,
        amount: i64,
        description: impl Into<String>,
        reference_id: Option<Uuid>,
    ) -> Result<CreditTransaction, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::NonPositiveAmount);
        }

        let description = description.into();
        let txn = db.begin().await?;

        let billing = BillingRecord::lock_for_update(&txn, workspace_id)
            .await
            .map_err(|_| LedgerError::NotFound)?
            .ok_or(LedgerError::NotFound)?;

        if billing.credit_balance < amount {
            txn.rollback().await?;
            return Err(LedgerError::InsufficientCredits);
        }

        BillingRecord::apply_delta(&txn, billing.id, -amount).await.map_err(|_| LedgerError::NotFound)?;

        let usage_entry = CreditTransaction::append(
            &txn,
            workspace_id,
            -amount,
            TransactionType::Usage,
            description,
            reference_id,
        )
        .await
        .map_err(|_| LedgerError::NotFound)?;

        let balance_after_debit = billing.credit_balance - amount;
        if billing.auto_recharge {
            if let (Some(threshold), Some(recharge_amount)) =
                (billing.auto_recharge_threshold, billing.auto_recharge_amount)
            {
                if balance_after_debit < threshold {
                    BillingRecord::apply_delta(&txn, billing.id, recharge_amount)
                        .await
                        .map_err(|_| LedgerError::NotFound)?;

                    CreditTransaction::append(
                        &txn,
                        workspace_id,
                        recharge_amount,
                        TransactionType::Purchase,
                        "Auto-recharge",
                        None,
                    )
                    .await
                    .map_err(|_| LedgerError::NotFound)?;
                }
            }
        }

        txn.commit().await?;
        Ok(usage_entry)
    }

    /// Issues a refund for a prior debit, guarding against a duplicate refund on activity
    /// retry by checking for an existing refund referencing the same `reference_id` inside
    /// the same locked transaction.
    pub async fn refund(
        db: &DatabaseConnection,
        workspace_id: Uuid,
        amount: i64,
        description: impl Into<String>,
        reference_id: Uuid,
    ) -> Result<CreditTransaction, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::NonPositiveAmount);
        }

        let description = description.into();
        let txn = db.begin().await?;

        let billing = BillingRecord::lock_for_update(&txn, workspace_id)
            .await
            .map_err(|_| LedgerError::NotFound)?
            .ok_or(LedgerError::NotFound)?;

        if let Some(existing) = CreditTransaction::find_refund(&txn, workspace_id, reference_id)
            .await
            .map_err(|_| LedgerError::NotFound)?
        {
            txn.rollback().await?;
            return Ok(existing);
        }

        BillingRecord::apply_delta(&txn, billing.id, amount).await.map_err(|_| LedgerError::NotFound)?;

        let entry = CreditTransaction::append(
            &txn,
            workspace_id,
            amount,
            TransactionType::Refund,
            description,
            Some(reference_id),
        )
        .await
        .map_err(|_| LedgerError::NotFound)?;

        txn.commit().await?;
        Ok(entry)
    }

    pub async fn get_billing(db: &DatabaseConnection, workspace_id: Uuid) -> Result<BillingRecord, LedgerError> {
        BillingRecord::find_by_workspace(db, workspace_id)
            .await
            .map_err(|_| LedgerError::NotFound)?
            .ok_or(LedgerError::NotFound)
    }

    pub async fn get_transactions(
        db: &DatabaseConnection,
        workspace_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<CreditTransaction>, u64), LedgerError> {
        CreditTransaction::list(db, workspace_id, page, per_page).await.map_err(|_| LedgerError::NotFound)
    }
}
