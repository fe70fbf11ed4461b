use loco_rs::prelude::*;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::_entities::{enrichment_jobs, prelude::*};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    PartiallyCompleted,
    Cancelled,
}

impl ToString for JobStatus {
    fn to_string(&self) -> String {
        match self {
            JobStatus::Pending => "pending".to_string(),
            JobStatus::Running => "running".to_string(),
            JobStatus::Completed => "completed".to_string(),
            JobStatus::Failed => "failed".to_string(),
            JobStatus::PartiallyCompleted => "partially_completed".to_string(),
            JobStatus::Cancelled => "cancelled".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentJob {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub status: String,
    pub requested_fields: serde_json::Value,
    pub waterfall_config: Option<serde_json::Value>,
    pub total_records: i32,
    pub completed_records: i32,
    pub failed_records: i32,
    pub estimated_credits: i64,
    pub created_by: Uuid,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
    pub completed_at: Option<chrono::NaiveDateTime>,
}

impl From<enrichment_jobs::Model> for EnrichmentJob {
    fn from(model: enrichment_jobs::Model) -> Self {
        Self {
            id: model.id,
            workspace_id: model.workspace_id,
            status: model.status,
            requested_fields: model.requested_fields,
            waterfall_config: model.waterfall_config,
            total_records: model.total_records,
            completed_records: model.completed_records,
            failed_records: model.failed_records,
            estimated_credits: model.estimated_credits,
            created_by: model.created_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
            completed_at: model.completed_at,
        }
    }
}

#[allow(clippy::too_many_arguments)]
impl EnrichmentJob {
    pub async fn create(
        db: &DatabaseConnection,
        workspace_id: Uuid,
        requested_fields: serde_json::Value,
        waterfall_config: Option<serde_json::Value>,
        total_records: i32,
        estimated_credits: i64,
        created_by: Uuid,
    ) -> Result<EnrichmentJob> {
        let job = enrichment_jobs::ActiveModel {
            id: Set(Uuid::new_v4()),
            workspace_id: Set(workspace_id),
            status: Set(JobStatus::Pending.to_string()),
            requested_fields: Set(requested_fields),
            waterfall_config: Set(waterfall_config),
            total_records: Set(total_records),
            completed_records: Set(0),
            failed_records: Set(0),
            estimated_credits: Set(estimated_credits),
            created_by: Set(created_by),
            created_at: Set(chrono::Utc::now().naive_utc()),
            updated_at: Set(chrono::Utc::now().naive_utc()),
            completed_at: Set(None),
        };

        let created = job.insert(db).await?;
        Ok(EnrichmentJob::from(created))
    }

    pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> Result<Option<EnrichmentJob>> {
        let job = EnrichmentJobs::find_by_id(id).one(db).await?;
        Ok(job.map(EnrichmentJob::from))
    }

    pub async fn find_scoped(db: &DatabaseConnection, workspace_id: Uuid, id: Uuid) -> Result<Option<EnrichmentJob>> {
        let job = EnrichmentJobs::find_by_id(id)
            .filter(enrichment_jobs::Column::WorkspaceId.eq(workspace_id))
            .one(db)
            .await?;
        Ok(job.map(EnrichmentJob::from))
    }

    pub async fn list_by_workspace(
        db: &DatabaseConnection,
        workspace_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<EnrichmentJob>, u64)> {
        let paginator = EnrichmentJobs::find()
            .filter(enrichment_jobs::Column::WorkspaceId.eq(workspace_id))
            .order_by_desc(enrichment_jobs::Column::CreatedAt)
            .paginate(db, per_page);

        let total_pages = paginator.num_pages().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items.into_iter().map(EnrichmentJob::from).collect(), total_pages))
    }

    pub async fn mark_running(db: &DatabaseConnection, id: Uuid) -> Result<EnrichmentJob> {
        Self::set_status(db, id, JobStatus::Running, None, None).await
    }

    pub async fn mark_cancelled(db: &DatabaseConnection, id: Uuid) -> Result<EnrichmentJob> {
        Self::set_status(db, id, JobStatus::Cancelled, None, None).await
    }

    pub async fn finish(
        db: &DatabaseConnection,
        id: Uuid,
        status: JobStatus,
        completed_records: i32,
        failed_records: i32,
    ) -> Result<EnrichmentJob> {
        Self::set_status(db, id, status, Some(completed_records), Some(failed_records)).await
    }

    async fn set_status(
        db: &DatabaseConnection,
        id: Uuid,
        status: JobStatus,
        completed_records: Option<i32>,
        failed_records: Option<i32>,
    ) -> Result<EnrichmentJob> {
        let job = EnrichmentJobs::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Job not found"))?;

        let mut active: enrichment_jobs::ActiveModel = job.into();
        active.status = Set(status.to_string());

        if let Some(completed) = completed_records {
            active.completed_records = Set(completed);
        }
        if let Some(failed) = failed_records {
            active.failed_records = Set(failed);
        }

        if matches!(
            status,
            JobStatus::Completed | JobStatus::Failed | JobStatus::PartiallyCompleted | JobStatus::Cancelled
        ) {
            active.completed_at = Set(Some(chrono::Utc::now().naive_utc()));
        }

        active.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = active.update(db).await?;
        Ok(EnrichmentJob::from(updated))
    }
}
