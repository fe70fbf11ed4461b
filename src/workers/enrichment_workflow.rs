use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use loco_rs::app::AppContext;
use loco_rs::prelude::*;
use loco_rs::worker::{AppWorker, Worker};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::enrichment_job::{EnrichmentJob, JobStatus};
use crate::services::circuit_breaker::CircuitBreaker;
use crate::services::config_service::ConfigService;
use crate::services::credential_vault::CredentialVault;
use crate::services::enrichment_activity::{EnrichRecordInput, EnrichmentActivity};
use crate::services::provider_adapters::ProviderAdapterRegistry;
use crate::services::provider_registry::ProviderRegistry;
use crate::services::webhook_service::WebhookService;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentWorkflowJob {
    pub job_id: Uuid,
    pub workspace_id: Uuid,
    pub batches: Vec<Vec<serde_json::Value>>,
    pub requested_fields: Vec<String>,
    pub field_providers: BTreeMap<String, Vec<String>>,
}

/// Deterministic, durable driver: iterates batches/records/fields/providers, delegating every
/// external effect to `EnrichmentActivity`. Sequential by design (see concurrency model) so
/// that credit accounting and idempotency keys stay simple.
pub struct EnrichmentWorkflowWorker {
    db: DatabaseConnection,
    activity: Arc<EnrichmentActivity>,
    webhooks: Arc<WebhookService>,
}

impl EnrichmentWorkflowWorker {
    async fn is_cancelled(&self, job_id: Uuid) -> bool {
        match EnrichmentJob::find_by_id(&self.db, job_id).await {
            Ok(Some(job)) => job.status == JobStatus::Cancelled.to_string(),
            _ => false,
        }
    }
}

impl AppWorker<EnrichmentWorkflowJob> for EnrichmentWorkflowWorker {
    fn build(ctx: &AppContext) -> Self {
        let master_key = ConfigService::master_encryption_key().expect("master encryption key must be configured");
        let vault = CredentialVault::new(&master_key).expect("master encryption key must be 32 bytes");

        Self {
            db: ctx.db.clone(),
            activity: Arc::new(EnrichmentActivity {
                registry: ProviderRegistry::default_registry(),
                adapters: ProviderAdapterRegistry::default_registry(reqwest::Client::new()),
                breaker: CircuitBreaker::with_system_clock(ConfigService::circuit_breaker_config()),
                vault,
            }),
            webhooks: Arc::new(WebhookService::new()),
        }
    }
}

#[async_trait]
impl Worker<EnrichmentWorkflowJob> for EnrichmentWorkflowWorker {
    async fn perform(&self, job_spec: EnrichmentWorkflowJob) -> sidekiq::Result<()> {
        self.run(job_spec)
            .await
            .map_err(|e| sidekiq::Error::Message(e.to_string()))
    }
}

impl EnrichmentWorkflowWorker {
    async fn run(&self, job_spec: EnrichmentWorkflowJob) -> Result<()> {
        let db = &self.db;
        let job_id = job_spec.job_id;
        let workspace_id = job_spec.workspace_id;

        EnrichmentJob::mark_running(db, job_id).await?;

        let mut completed_records = 0i32;
        let mut failed_records = 0i32;
        let mut total_credits_consumed = 0i64;
        let mut cancelled = false;
        let mut global_idx: i32 = 0;

        'batches: for batch in &job_spec.batches {
            if self.is_cancelled(job_id).await {
                cancelled = true;
                break 'batches;
            }

            for (local_idx, input_data) in batch.iter().enumerate() {
                if self.is_cancelled(job_id).await {
                    cancelled = true;
                    break 'batches;
                }

                let record_index = global_idx + local_idx as i32;
                let mut record_all_fields_success = true;

                for field in &job_spec.requested_fields {
                    let providers = job_spec.field_providers.get(field).cloned().unwrap_or_default();
                    if providers.is_empty() {
                        record_all_fields_success = false;
                        continue;
                    }

                    let mut field_satisfied = false;

                    for provider_slug in &providers {
                        let idempotency_key = format!("{job_id}:{record_index}:{field}:{provider_slug}");

                        let activity_input = EnrichRecordInput {
                            job_id,
                            workspace_id,
                            record_index,
                            input_data: input_data.clone(),
                            field_name: field.clone(),
                            provider_slug: provider_slug.clone(),
                            idempotency_key,
                        };

                        match self.activity.enrich_record(db, activity_input).await {
                            Ok(output) if output.success && output.is_complete => {
                                total_credits_consumed += output.credits_consumed;
                                field_satisfied = true;
                                break;
                            }
                            Ok(output) => {
                                total_credits_consumed += output.credits_consumed;
                            }
                            Err(err) if err.is_retryable() => {
                                tracing::warn!(
                                    job_id = %job_id,
                                    record_index,
                                    field = %field,
                                    provider_slug = %provider_slug,
                                    error = %err,
                                    "enrichment activity failed transiently, trying next waterfall step"
                                );
                            }
                            Err(err) => {
                                tracing::warn!(
                                    job_id = %job_id,
                                    record_index,
                                    field = %field,
                                    provider_slug = %provider_slug,
                                    error = %err,
                                    "enrichment activity failed terminally, abandoning this field's waterfall"
                                );
                                break;
                            }
                        }
                    }

                    if !field_satisfied {
                        record_all_fields_success = false;
                    }
                }

                if record_all_fields_success {
                    completed_records += 1;
                } else {
                    failed_records += 1;
                }
            }

            global_idx += batch.len() as i32;
        }

        let total_records: i32 = job_spec.batches.iter().map(Vec::len).sum::<usize>() as i32;

        let final_status = if cancelled {
            JobStatus::Cancelled
        } else if failed_records == 0 && completed_records == total_records {
            JobStatus::Completed
        } else if completed_records == 0 {
            JobStatus::Failed
        } else {
            JobStatus::PartiallyCompleted
        };

        EnrichmentJob::finish(db, job_id, final_status, completed_records, failed_records).await?;

        let payload = serde_json::json!({
            "event": format!("job.{}", final_status.to_string()),
            "jobId": job_id,
            "workspaceId": workspace_id,
            "status": final_status.to_string(),
            "summary": {
                "totalRecords": total_records,
                "completedRecords": completed_records,
                "failedRecords": failed_records,
                "creditsConsumed": total_credits_consumed,
            },
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        self.webhooks.deliver_event(db, workspace_id, payload).await;

        Ok(())
    }
}
