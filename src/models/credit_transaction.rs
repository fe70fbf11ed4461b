use loco_rs::prelude::*;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::_entities::{credit_transactions, prelude::*};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Purchase,
    Usage,
    Refund,
    Bonus,
    Adjustment,
}

impl ToString for TransactionType {
    fn to_string(&self) -> String {
        match self {
            TransactionType::Purchase => "purchase".to_string(),
            TransactionType::Usage => "usage".to_string(),
            TransactionType::Refund => "refund".to_string(),
            TransactionType::Bonus => "bonus".to_string(),
            TransactionType::Adjustment => "adjustment".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditTransaction {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub amount: i64,
    pub transaction_type: String,
    pub description: String,
    pub reference_id: Option<Uuid>,
    pub created_at: chrono::NaiveDateTime,
}

impl From<credit_transactions::Model> for CreditTransaction {
    fn from(model: credit_transactions::Model) -> Self {
        Self {
            id: model.id,
            workspace_id: model.workspace_id,
            amount: model.amount,
            transaction_type: model.transaction_type,
            description: model.description,
            reference_id: model.reference_id,
            created_at: model.created_at,
        }
    }
}

impl CreditTransaction {
    /// Append a ledger entry within the caller's transaction. Callers are responsible for
    /// holding the row lock on the billing record for the duration of the surrounding transaction.
    pub async fn append<C: ConnectionTrait>(
        db: &C,
        workspace_id: Uuid,
        amount: i64,
        transaction_type: TransactionType,
        description: impl Into<String>,
        reference_id: Option<Uuid>,
    ) -> Result<CreditTransaction> {
        let entry = credit_transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            workspace_id: Set(workspace_id),
            amount: Set(amount),
            transaction_type: Set(transaction_type.to_string()),
            description: Set(description.into()),
            reference_id: Set(reference_id),
            created_at: Set(chrono::Utc::now().naive_utc()),
        };

        let created = entry.insert(db).await?;
        Ok(CreditTransaction::from(created))
    }

    /// True if a refund referencing `reference_id` has already been recorded — guards against
    /// double-refunding the same debit on activity retry.
    pub async fn refund_exists<C: ConnectionTrait>(
        db: &C,
        workspace_id: Uuid,
        reference_id: Uuid,
    ) -> Result<bool> {
        let existing = CreditTransactions::find()
            .filter(credit_transactions::Column::WorkspaceId.eq(workspace_id))
            .filter(credit_transactions::Column::ReferenceId.eq(reference_id))
            .filter(credit_transactions::Column::TransactionType.eq(TransactionType::Refund.to_string()))
            .one(db)
            .await?;

        Ok(existing.is_some())
    }

    /// Fetches a previously recorded refund for `reference_id`, if any.
    pub async fn find_refund<C: ConnectionTrait>(
        db: &C,
        workspace_id: Uuid,
        reference_id: Uuid,
    ) -> Result<Option<CreditTransaction>> {
        let existing = CreditTransactions::find()
            .filter(credit_transactions::Column::WorkspaceId.eq(workspace_id))
            .filter(credit_transactions::Column::ReferenceId.eq(reference_id))
            .filter(credit_transactions::Column::TransactionType.eq(TransactionType::Refund.to_string()))
            .one(db)
            .await?;

        Ok(existing.map(CreditTransaction::from))
    }

    /// Reverse-chronological pagination of a workspace's ledger.
    pub async fn list(
        db: &DatabaseConnection,
        workspace_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<CreditTransaction>, u64)> {
        let paginator = CreditTransactions::find()
            .filter(credit_transactions::Column::WorkspaceId.eq(workspace_id))
            .order_by_desc(credit_transactions::Column::CreatedAt)
            .paginate(db, per_page);

        let total_pages = paginator.num_pages().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items.into_iter().map(CreditTransaction::from).collect(), total_pages))
    }
}
