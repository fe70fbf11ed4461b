use std::collections::BTreeMap;
use std::sync::Arc;

use enrichment_orchestrator::app::App;
use enrichment_orchestrator::models::billing_record::BillingRecord;
use enrichment_orchestrator::services::circuit_breaker::{Clock, CircuitBreaker, CircuitBreakerConfig};
use enrichment_orchestrator::services::credential_vault::CredentialVault;
use enrichment_orchestrator::services::enrichment_activity::{EnrichRecordInput, EnrichmentActivity};
use enrichment_orchestrator::services::provider_adapters::{FakeAdapter, ProviderAdapter, ProviderAdapterRegistry};
use enrichment_orchestrator::services::provider_registry::{
    ProviderDefinition, ProviderRegistry, RequiredFieldsSchema,
};
use loco_rs::testing;
use migration::Migrator;
use sea_orm::TransactionTrait;
use serial_test::serial;
use uuid::Uuid;

fn waterfall_registry() -> ProviderRegistry {
    ProviderRegistry::new(vec![
        ProviderDefinition {
            slug: "fake_partial".to_string(),
            display_name: "Fake Partial".to_string(),
            supported_fields: ["company_info"].into_iter().map(String::from).collect(),
            credit_cost_per_call: 2,
            input_schema: RequiredFieldsSchema::new([] as [&str; 0]),
            output_schema: RequiredFieldsSchema::new([] as [&str; 0]),
            required_credential_type: "fake".to_string(),
        },
        ProviderDefinition {
            slug: "fake_complete".to_string(),
            display_name: "Fake Complete".to_string(),
            supported_fields: ["company_info"].into_iter().map(String::from).collect(),
            credit_cost_per_call: 1,
            input_schema: RequiredFieldsSchema::new([] as [&str; 0]),
            output_schema: RequiredFieldsSchema::new([] as [&str; 0]),
            required_credential_type: "fake".to_string(),
        },
    ])
    .unwrap()
}

/// Reproduces the waterfall scenario where the first provider in a field's ordering answers
/// only partially: its debit must be refunded and the record must not count as a success, so
/// the workflow's net spend reflects only the provider that actually completed the field.
#[tokio::test]
#[serial]
async fn partial_result_is_refunded_before_falling_through_to_the_next_provider() {
    testing::request::<App, Migrator, _, _>(|_request, ctx| async move {
        let db = ctx.db.clone();
        let workspace_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let billing = BillingRecord::find_or_create(&db, workspace_id).await.unwrap();
        let txn = db.begin().await.unwrap();
        BillingRecord::apply_delta(&txn, billing.id, 100).await.unwrap();
        txn.commit().await.unwrap();

        let vault = CredentialVault::new(&[9u8; 32]).unwrap();
        vault.store(&db, workspace_id, "fake", "key-id", "secret-value", user_id).await.unwrap();

        let mut adapters: BTreeMap<String, Arc<dyn ProviderAdapter>> = BTreeMap::new();
        adapters.insert(
            "fake_partial".to_string(),
            Arc::new(FakeAdapter::incomplete(serde_json::json!({"employee_count": 42}))),
        );
        adapters.insert(
            "fake_complete".to_string(),
            Arc::new(FakeAdapter::complete(serde_json::json!({"employee_count": 42, "industry": "saas"}))),
        );

        let activity = EnrichmentActivity {
            registry: waterfall_registry(),
            adapters: ProviderAdapterRegistry::new(adapters),
            breaker: CircuitBreaker::new(CircuitBreakerConfig::default(), Arc::new(NoopClock)),
            vault,
        };

        let job_id = Uuid::new_v4();
        let record_index = 0;

        let partial = activity
            .enrich_record(
                &db,
                EnrichRecordInput {
                    job_id,
                    workspace_id,
                    record_index,
                    input_data: serde_json::json!({}),
                    field_name: "company_info".to_string(),
                    provider_slug: "fake_partial".to_string(),
                    idempotency_key: format!("{job_id}:{record_index}:company_info:fake_partial"),
                },
            )
            .await
            .unwrap();

        assert!(!partial.success);
        assert!(!partial.is_complete);
        assert_eq!(partial.credits_consumed, 0, "a partial result must refund its debit");

        let complete = activity
            .enrich_record(
                &db,
                EnrichRecordInput {
                    job_id,
                    workspace_id,
                    record_index,
                    input_data: serde_json::json!({}),
                    field_name: "company_info".to_string(),
                    provider_slug: "fake_complete".to_string(),
                    idempotency_key: format!("{job_id}:{record_index}:company_info:fake_complete"),
                },
            )
            .await
            .unwrap();

        assert!(complete.success);
        assert!(complete.is_complete);
        assert_eq!(complete.credits_consumed, 1);

        let balance = BillingRecord::find_by_workspace(&db, workspace_id).await.unwrap().unwrap();
        assert_eq!(balance.credit_balance, 99, "only the completing provider's cost should be spent");
    })
    .await;
}

struct NoopClock;

impl Clock for NoopClock {
    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::Utc::now()
    }
}
