use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::models::api_credential::ApiCredential;
use crate::models::enrichment_record::{EnrichmentRecord, NewEnrichmentRecord, RecordStatus};
use crate::services::circuit_breaker::CircuitBreaker;
use crate::services::credential_vault::CredentialVault;
use crate::services::credit_ledger::CreditLedger;
use crate::services::errors::{ActivityError, LedgerError};
use crate::services::provider_adapters::{AdapterCredentials, ProviderAdapterRegistry};
use crate::services::provider_registry::ProviderRegistry;

pub struct EnrichRecordInput {
    pub job_id: Uuid,
    pub workspace_id: Uuid,
    pub record_index: i32,
    pub input_data: serde_json::Value,
    pub field_name: String,
    pub provider_slug: String,
    pub idempotency_key: String,
}

pub struct EnrichRecordOutput {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub is_complete: bool,
    pub provider_slug: String,
    pub credits_consumed: i64,
    pub error: Option<String>,
}

impl From<EnrichmentRecord> for EnrichRecordOutput {
    fn from(record: EnrichmentRecord) -> Self {
        // `isComplete` is not a persisted column: a persisted `success` record was, by
        // construction in step 9, the terminal attempt for that idempotency key.
        let success = record.status == RecordStatus::Success.to_string();
        Self {
            success,
            data: record.output_data,
            is_complete: success,
            provider_slug: record.provider_slug.unwrap_or_default(),
            credits_consumed: record.credits_consumed,
            error: record.error_reason,
        }
    }
}

/// The single (record × field × provider) attempt. Invoked by the workflow worker once per
/// waterfall step; every side effect (debit, refund, breaker update, record persistence) is
/// performed at most once per `idempotencyKey` thanks to the probe in step 1.
pub struct EnrichmentActivity {
    pub registry: ProviderRegistry,
    pub adapters: ProviderAdapterRegistry,
    pub breaker: CircuitBreaker,
    pub vault: CredentialVault,
}

impl EnrichmentActivity {
    pub async fn enrich_record(
        &self,
        db: &DatabaseConnection,
        input: EnrichRecordInput,
    ) -> Result<EnrichRecordOutput, ActivityError> {
        // Step 1: idempotency probe.
        if let Some(existing) = EnrichmentRecord::find_by_idempotency_key(db, &input.idempotency_key)
            .await
            .map_err(|e| ActivityError::Transient(e.to_string()))?
        {
            return Ok(existing.into());
        }

        // Step 2: provider lookup.
        let provider = self
            .registry
            .get_provider(&input.provider_slug)
            .ok_or_else(|| ActivityError::UnknownProvider(input.provider_slug.clone()))?
            .clone();

        // Step 3: circuit breaker gate.
        if !self.breaker.can_call(&provider.slug) {
            self.persist_failure(db, &input, 0, None, "Circuit breaker open".to_string()).await?;
            return Err(ActivityError::BreakerOpen(provider.slug));
        }

        // Step 4: debit credits.
        let debit = CreditLedger::debit(
            db,
            input.workspace_id,
            provider.credit_cost_per_call,
            format!("Enrichment: {} via {}", input.field_name, provider.slug),
            None,
        )
        .await;

        let debit_txn = match debit {
            Ok(txn) => txn,
            Err(LedgerError::InsufficientCredits) => {
                self.persist_failure(db, &input, 0, None, "Insufficient credits".to_string()).await?;
                return Err(ActivityError::InsufficientCredits);
            }
            Err(other) => return Err(ActivityError::Transient(other.to_string())),
        };

        // Step 5: fetch credential.
        let credential = match ApiCredential::find_by_workspace_and_provider(
            db,
            input.workspace_id,
            &provider.required_credential_type,
        )
        .await
        {
            Ok(Some(credential)) => credential,
            Ok(None) => {
                CreditLedger::refund(
                    db,
                    input.workspace_id,
                    provider.credit_cost_per_call,
                    "Refund: missing credentials",
                    debit_txn.id,
                )
                .await
                .map_err(|e| ActivityError::Transient(e.to_string()))?;

                return Err(ActivityError::MissingCredentials(provider.required_credential_type.clone()));
            }
            Err(e) => return Err(ActivityError::Transient(e.to_string())),
        };

        // Step 6: decrypt.
        let decrypted = match self.vault.decrypt_credential(db, input.workspace_id, credential.id).await {
            Ok(decrypted) => decrypted,
            Err(e) => {
                CreditLedger::refund(
                    db,
                    input.workspace_id,
                    provider.credit_cost_per_call,
                    "Refund: credential decryption failed",
                    debit_txn.id,
                )
                .await
                .map_err(|e| ActivityError::Transient(e.to_string()))?;

                return Err(ActivityError::CredentialDecryptionFailed(e.to_string()));
            }
        };

        let adapter = self
            .adapters
            .get(&provider.slug)
            .ok_or_else(|| ActivityError::UnknownProvider(provider.slug.clone()))?;

        let adapter_credentials = AdapterCredentials { key: decrypted.key, secret: decrypted.secret };

        // Step 7: invoke provider adapter.
        let adapter_result = match adapter.enrich(&adapter_credentials, &input.input_data).await {
            Ok(result) => result,
            Err(err) => {
                self.breaker.record_failure(&provider.slug);
                CreditLedger::refund(
                    db,
                    input.workspace_id,
                    provider.credit_cost_per_call,
                    "Refund: adapter error",
                    debit_txn.id,
                )
                .await
                .map_err(|e| ActivityError::Transient(e.to_string()))?;

                self.persist_failure(db, &input, 0, None, err.clone()).await?;
                return Err(ActivityError::AdapterError(err));
            }
        };

        if adapter_result.success && adapter_result.is_complete {
            if let Some(data) = &adapter_result.data {
                // Step 8: validate output.
                if let Err(issues) = provider.output_schema.validate(data) {
                    self.breaker.record_failure(&provider.slug);
                    CreditLedger::refund(
                        db,
                        input.workspace_id,
                        provider.credit_cost_per_call,
                        "Refund: output validation failed",
                        debit_txn.id,
                    )
                    .await
                    .map_err(|e| ActivityError::Transient(e.to_string()))?;

                    let reason = format!("Output schema validation failed: {issues}");
                    self.persist_failure(db, &input, 0, None, reason.clone()).await?;
                    return Err(ActivityError::OutputValidationFailed(issues));
                }
            }

            // Step 9: success path. Only a complete result keeps its debit.
            self.breaker.record_success(&provider.slug);

            let record = EnrichmentRecord::insert_idempotent(
                db,
                NewEnrichmentRecord {
                    job_id: input.job_id,
                    workspace_id: input.workspace_id,
                    record_index: input.record_index,
                    field_name: input.field_name.clone(),
                    input_data: input.input_data.clone(),
                    output_data: adapter_result.data.clone(),
                    provider_slug: Some(provider.slug.clone()),
                    credits_consumed: provider.credit_cost_per_call,
                    status: RecordStatus::Success,
                    error_reason: None,
                    idempotency_key: input.idempotency_key.clone(),
                    credit_transaction_id: Some(debit_txn.id),
                },
            )
            .await
            .map_err(|e| ActivityError::Transient(e.to_string()))?;

            Ok(EnrichRecordOutput {
                success: true,
                data: record.output_data,
                is_complete: true,
                provider_slug: provider.slug,
                credits_consumed: provider.credit_cost_per_call,
                error: None,
            })
        } else if adapter_result.success {
            // Step 9b: the provider answered but only partially — the waterfall must still
            // try the next provider, so this attempt is refunded in full like any other
            // non-complete outcome. The call itself worked, so the breaker sees a success.
            self.breaker.record_success(&provider.slug);

            CreditLedger::refund(
                db,
                input.workspace_id,
                provider.credit_cost_per_call,
                "Refund: partial result",
                debit_txn.id,
            )
            .await
            .map_err(|e| ActivityError::Transient(e.to_string()))?;

            self.persist_failure(db, &input, 0, None, "Partial result, not complete".to_string()).await?;

            Ok(EnrichRecordOutput {
                success: false,
                data: None,
                is_complete: false,
                provider_slug: provider.slug,
                credits_consumed: 0,
                error: None,
            })
        } else {
            // Step 10: adapter-signalled failure.
            self.breaker.record_failure(&provider.slug);
            let error = adapter_result.error.unwrap_or_else(|| "adapter reported failure".to_string());

            CreditLedger::refund(
                db,
                input.workspace_id,
                provider.credit_cost_per_call,
                "Refund: adapter-signalled failure",
                debit_txn.id,
            )
            .await
            .map_err(|e| ActivityError::Transient(e.to_string()))?;

            self.persist_failure(db, &input, 0, None, error.clone()).await?;

            Ok(EnrichRecordOutput {
                success: false,
                data: None,
                is_complete: false,
                provider_slug: provider.slug,
                credits_consumed: 0,
                error: Some(error),
            })
        }
    }

    async fn persist_failure(
        &self,
        db: &DatabaseConnection,
        input: &EnrichRecordInput,
        credits_consumed: i64,
        credit_transaction_id: Option<Uuid>,
        reason: String,
    ) -> Result<(), ActivityError> {
        EnrichmentRecord::insert_idempotent(
            db,
            NewEnrichmentRecord {
                job_id: input.job_id,
                workspace_id: input.workspace_id,
                record_index: input.record_index,
                field_name: input.field_name.clone(),
                input_data: input.input_data.clone(),
                output_data: None,
                provider_slug: Some(input.provider_slug.clone()),
                credits_consumed,
                status: RecordStatus::Failed,
                error_reason: Some(reason),
                idempotency_key: input.idempotency_key.clone(),
                credit_transaction_id,
            },
        )
        .await
        .map_err(|e| ActivityError::Transient(e.to_string()))?;

        Ok(())
    }
}
