use std::collections::BTreeMap;

use loco_rs::prelude::*;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::billing_record::BillingRecord;
use crate::models::enrichment_job::EnrichmentJob;
use crate::models::enrichment_record::EnrichmentRecord;
use crate::services::errors::EnrichmentError;
use crate::services::provider_registry::{ProviderRegistry, WaterfallConfig};
use crate::workers::enrichment_workflow::{EnrichmentWorkflowJob, EnrichmentWorkflowWorker};

const MAX_BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobRequest {
    pub records: Vec<serde_json::Value>,
    pub fields: Vec<String>,
    pub waterfall_config: Option<WaterfallConfig>,
}

/// Job intake: validates the request against the registry and the workspace's credit
/// balance, persists the job, and hands a pre-resolved execution plan to the workflow worker.
pub struct EnrichmentService;

impl EnrichmentService {
    pub async fn create_job(
        ctx: &AppContext,
        registry: &ProviderRegistry,
        workspace_id: Uuid,
        user_id: Uuid,
        request: CreateJobRequest,
    ) -> Result<EnrichmentJob, EnrichmentError> {
        // Step 1: every requested field must have at least one supporting provider.
        for field in &request.fields {
            if registry.get_providers_for_field(field).is_empty() {
                return Err(EnrichmentError::validation(format!(
                    "No provider supports field \"{field}\""
                )));
            }
        }

        // Step 2: validate any waterfall-named providers exist.
        if let Some(waterfall) = &request.waterfall_config {
            let all_slugs: Vec<String> =
                waterfall.fields.values().flat_map(|w| w.providers.clone()).collect();
            registry.validate_providers(&all_slugs)?;
        }

        // Step 3: resolve field -> ordered provider list, then input-validate every record
        // against the head provider's input schema.
        let field_providers = registry
            .resolve_field_providers(&request.fields, request.waterfall_config.as_ref())?;

        for field in &request.fields {
            let providers = field_providers.get(field).cloned().unwrap_or_default();
            let Some(head_slug) = providers.first() else { continue };
            let provider = registry
                .get_provider(head_slug)
                .expect("resolve_field_providers only returns known slugs");

            for (index, record) in request.records.iter().enumerate() {
                if let Err(issues) = provider.input_schema.validate(record) {
                    return Err(EnrichmentError::validation(format!(
                        "Record {index} fails validation for provider {head_slug}: {issues}"
                    )));
                }
            }
        }

        // Step 4: estimate credits.
        let estimated_credits = registry.estimate_credits(
            request.records.len() as i64,
            &request.fields,
            request.waterfall_config.as_ref(),
        )?;

        // Step 5: balance check. A workspace with no billing row yet has an implicit
        // zero balance; creating one here means the very first job request surfaces
        // InsufficientCredits rather than a spurious NotFound.
        let billing = BillingRecord::find_or_create(&ctx.db, workspace_id)
            .await
            .map_err(|e| EnrichmentError::internal(e))?;

        if billing.credit_balance < estimated_credits {
            return Err(EnrichmentError::insufficient_credits(
                "Estimated cost exceeds available credit balance",
            ));
        }

        // Step 6: split into batches of at most 1000, preserving order.
        let batches: Vec<Vec<serde_json::Value>> =
            request.records.chunks(MAX_BATCH_SIZE).map(<[serde_json::Value]>::to_vec).collect();

        // Step 7: persist the job row.
        let requested_fields_json = serde_json::to_value(&request.fields).unwrap_or_default();
        let waterfall_json = request.waterfall_config.as_ref().map(|w| serde_json::to_value(w).unwrap_or_default());

        let job = EnrichmentJob::create(
            &ctx.db,
            workspace_id,
            requested_fields_json,
            waterfall_json,
            request.records.len() as i32,
            estimated_credits,
            user_id,
        )
        .await
        .map_err(|e| EnrichmentError::internal(e))?;

        // Step 8/9: hand the precomputed plan to the durable workflow worker.
        let job_payload = EnrichmentWorkflowJob {
            job_id: job.id,
            workspace_id,
            batches,
            requested_fields: request.fields,
            field_providers,
        };

        EnrichmentWorkflowWorker::perform_later(ctx, job_payload)
            .await
            .map_err(|e| EnrichmentError::internal(e))?;

        Ok(job)
    }

    pub async fn cancel_job(
        db: &DatabaseConnection,
        workspace_id: Uuid,
        job_id: Uuid,
    ) -> Result<EnrichmentJob, EnrichmentError> {
        EnrichmentJob::find_scoped(db, workspace_id, job_id)
            .await
            .map_err(|e| EnrichmentError::internal(e))?
            .ok_or_else(|| EnrichmentError::not_found("Job not found"))?;

        // Cancellation is a signal, not an immediate stop: the workflow worker polls the
        // job's status column at every loop boundary and exits once it observes `cancelled`.
        EnrichmentJob::mark_cancelled(db, job_id).await.map_err(|e| EnrichmentError::internal(e))
    }

    pub async fn get_job(db: &DatabaseConnection, workspace_id: Uuid, job_id: Uuid) -> Result<EnrichmentJob, EnrichmentError> {
        EnrichmentJob::find_scoped(db, workspace_id, job_id)
            .await
            .map_err(|e| EnrichmentError::internal(e))?
            .ok_or_else(|| EnrichmentError::not_found("Job not found"))
    }

    pub async fn list_jobs(
        db: &DatabaseConnection,
        workspace_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<EnrichmentJob>, u64), EnrichmentError> {
        EnrichmentJob::list_by_workspace(db, workspace_id, page, per_page)
            .await
            .map_err(|e| EnrichmentError::internal(e))
    }

    pub async fn get_record(
        db: &DatabaseConnection,
        workspace_id: Uuid,
        record_id: Uuid,
    ) -> Result<EnrichmentRecord, EnrichmentError> {
        EnrichmentRecord::find_scoped(db, workspace_id, record_id)
            .await
            .map_err(|e| EnrichmentError::internal(e))?
            .ok_or_else(|| EnrichmentError::not_found("Record not found"))
    }

    pub async fn list_records(
        db: &DatabaseConnection,
        job_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<EnrichmentRecord>, u64), EnrichmentError> {
        EnrichmentRecord::list_by_job(db, job_id, page, per_page).await.map_err(|e| EnrichmentError::internal(e))
    }
}
