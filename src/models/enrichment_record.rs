use loco_rs::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::_entities::{enrichment_records, prelude::*};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Success,
    Failed,
}

impl ToString for RecordStatus {
    fn to_string(&self) -> String {
        match self {
            RecordStatus::Success => "success".to_string(),
            RecordStatus::Failed => "failed".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    pub id: Uuid,
    pub job_id: Uuid,
    pub workspace_id: Uuid,
    pub record_index: i32,
    pub field_name: String,
    pub input_data: serde_json::Value,
    pub output_data: Option<serde_json::Value>,
    pub provider_slug: Option<String>,
    pub credits_consumed: i64,
    pub status: String,
    pub error_reason: Option<String>,
    pub idempotency_key: String,
    pub credit_transaction_id: Option<Uuid>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl From<enrichment_records::Model> for EnrichmentRecord {
    fn from(model: enrichment_records::Model) -> Self {
        Self {
            id: model.id,
            job_id: model.job_id,
            workspace_id: model.workspace_id,
            record_index: model.record_index,
            field_name: model.field_name,
            input_data: model.input_data,
            output_data: model.output_data,
            provider_slug: model.provider_slug,
            credits_consumed: model.credits_consumed,
            status: model.status,
            error_reason: model.error_reason,
            idempotency_key: model.idempotency_key,
            credit_transaction_id: model.credit_transaction_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Fields needed to persist one activity outcome.
#[allow(clippy::too_many_arguments)]
pub struct NewEnrichmentRecord {
    pub job_id: Uuid,
    pub workspace_id: Uuid,
    pub record_index: i32,
    pub field_name: String,
    pub input_data: serde_json::Value,
    pub output_data: Option<serde_json::Value>,
    pub provider_slug: Option<String>,
    pub credits_consumed: i64,
    pub status: RecordStatus,
    pub error_reason: Option<String>,
    pub idempotency_key: String,
    pub credit_transaction_id: Option<Uuid>,
}

impl EnrichmentRecord {
    pub async fn find_by_idempotency_key(
        db: &DatabaseConnection,
        idempotency_key: &str,
    ) -> Result<Option<EnrichmentRecord>> {
        let record = EnrichmentRecords::find()
            .filter(enrichment_records::Column::IdempotencyKey.eq(idempotency_key))
            .one(db)
            .await?;

        Ok(record.map(EnrichmentRecord::from))
    }

    /// Insert the outcome, converging on a pre-existing row if `idempotency_key` already exists
    /// (`INSERT ... ON CONFLICT DO NOTHING` followed by a read-back).
    pub async fn insert_idempotent(db: &DatabaseConnection, new: NewEnrichmentRecord) -> Result<EnrichmentRecord> {
        let active = enrichment_records::ActiveModel {
            id: Set(Uuid::new_v4()),
            job_id: Set(new.job_id),
            workspace_id: Set(new.workspace_id),
            record_index: Set(new.record_index),
            field_name: Set(new.field_name),
            input_data: Set(new.input_data),
            output_data: Set(new.output_data),
            provider_slug: Set(new.provider_slug),
            credits_consumed: Set(new.credits_consumed),
            status: Set(new.status.to_string()),
            error_reason: Set(new.error_reason),
            idempotency_key: Set(new.idempotency_key.clone()),
            credit_transaction_id: Set(new.credit_transaction_id),
            created_at: Set(chrono::Utc::now().naive_utc()),
            updated_at: Set(chrono::Utc::now().naive_utc()),
        };

        EnrichmentRecords::insert(active)
            .on_conflict(
                OnConflict::column(enrichment_records::Column::IdempotencyKey)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(db)
            .await
            .ok();

        Self::find_by_idempotency_key(db, &new.idempotency_key)
            .await?
            .ok_or_else(|| Error::string("Enrichment record vanished after idempotent insert"))
    }

    pub async fn find_scoped(
        db: &DatabaseConnection,
        workspace_id: Uuid,
        id: Uuid,
    ) -> Result<Option<EnrichmentRecord>> {
        let record = EnrichmentRecords::find_by_id(id)
            .filter(enrichment_records::Column::WorkspaceId.eq(workspace_id))
            .one(db)
            .await?;

        Ok(record.map(EnrichmentRecord::from))
    }

    pub async fn list_by_job(
        db: &DatabaseConnection,
        job_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<EnrichmentRecord>, u64)> {
        let paginator = EnrichmentRecords::find()
            .filter(enrichment_records::Column::JobId.eq(job_id))
            .order_by_asc(enrichment_records::Column::RecordIndex)
            .paginate(db, per_page);

        let total_pages = paginator.num_pages().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items.into_iter().map(EnrichmentRecord::from).collect(), total_pages))
    }
}
