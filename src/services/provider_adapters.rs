use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const ADAPTER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct AdapterCredentials {
    pub key: String,
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterResult {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub is_complete: bool,
    pub error: Option<String>,
}

/// Provider-specific HTTP details are outside the core's concern; this trait is the
/// boundary the enrichment activity calls across. Implementations self-enforce a 30s
/// deadline — `enrich` returning `Err` represents an adapter exception (network failure,
/// timeout, malformed response), distinct from a well-formed `AdapterResult { success: false, .. }`.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    async fn enrich(
        &self,
        credentials: &AdapterCredentials,
        input_data: &serde_json::Value,
    ) -> Result<AdapterResult, String>;
}

/// Generic JSON-over-HTTPS adapter: POSTs `{credentials, input}` to `endpoint` and expects
/// an `AdapterResult`-shaped JSON body back. Used for every catalog provider since the HTTP
/// contract itself is identical across them; only `endpoint` varies.
pub struct HttpJsonAdapter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpJsonAdapter {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self { client, endpoint: endpoint.into() }
    }
}

#[derive(Serialize)]
struct AdapterRequestBody<'a> {
    credentials: &'a AdapterCredentials,
    input: &'a serde_json::Value,
}

impl Serialize for AdapterCredentials {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("AdapterCredentials", 2)?;
        state.serialize_field("key", &self.key)?;
        state.serialize_field("secret", &self.secret)?;
        state.end()
    }
}

#[async_trait]
impl ProviderAdapter for HttpJsonAdapter {
    async fn enrich(
        &self,
        credentials: &AdapterCredentials,
        input_data: &serde_json::Value,
    ) -> Result<AdapterResult, String> {
        let request = self
            .client
            .post(&self.endpoint)
            .json(&AdapterRequestBody { credentials, input: input_data })
            .send();

        let response = tokio::time::timeout(ADAPTER_TIMEOUT, request)
            .await
            .map_err(|_| "provider adapter timed out after 30s".to_string())?
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("provider returned status {}", response.status()));
        }

        tokio::time::timeout(ADAPTER_TIMEOUT, response.json::<AdapterResult>())
            .await
            .map_err(|_| "provider adapter timed out after 30s".to_string())?
            .map_err(|e| format!("malformed adapter response: {e}"))
    }
}

/// Deterministic adapter used by tests and local development to exercise the activity and
/// workflow pipeline without a network dependency.
pub struct FakeAdapter {
    pub result: AdapterResult,
}

impl FakeAdapter {
    pub fn complete(data: serde_json::Value) -> Self {
        Self { result: AdapterResult { success: true, data: Some(data), is_complete: true, error: None } }
    }

    pub fn incomplete(data: serde_json::Value) -> Self {
        Self { result: AdapterResult { success: true, data: Some(data), is_complete: false, error: None } }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { result: AdapterResult { success: false, data: None, is_complete: false, error: Some(error.into()) } }
    }
}

#[async_trait]
impl ProviderAdapter for FakeAdapter {
    async fn enrich(
        &self,
        _credentials: &AdapterCredentials,
        _input_data: &serde_json::Value,
    ) -> Result<AdapterResult, String> {
        Ok(self.result.clone())
    }
}

#[derive(Clone)]
pub struct ProviderAdapterRegistry {
    adapters: BTreeMap<String, Arc<dyn ProviderAdapter>>,
}

impl ProviderAdapterRegistry {
    pub fn new(adapters: BTreeMap<String, Arc<dyn ProviderAdapter>>) -> Self {
        Self { adapters }
    }

    pub fn default_registry(client: reqwest::Client) -> Self {
        let mut adapters: BTreeMap<String, Arc<dyn ProviderAdapter>> = BTreeMap::new();
        adapters.insert(
            "apollo".to_string(),
            Arc::new(HttpJsonAdapter::new(client.clone(), "https://api.apollo.io/v1/enrich")),
        );
        adapters.insert(
            "clearbit".to_string(),
            Arc::new(HttpJsonAdapter::new(client.clone(), "https://api.clearbit.com/v2/enrich")),
        );
        adapters.insert(
            "hunter".to_string(),
            Arc::new(HttpJsonAdapter::new(client, "https://api.hunter.io/v2/enrich")),
        );
        Self::new(adapters)
    }

    pub fn get(&self, slug: &str) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(slug).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_adapter_reports_complete_result() {
        let adapter = FakeAdapter::complete(serde_json::json!({"email": "a@example.com"}));
        let creds = AdapterCredentials { key: "k".to_string(), secret: "s".to_string() };
        let result = adapter.enrich(&creds, &serde_json::json!({})).await.unwrap();
        assert!(result.success);
        assert!(result.is_complete);
    }

    #[tokio::test]
    async fn fake_adapter_reports_signalled_failure() {
        let adapter = FakeAdapter::failure("rate limited");
        let creds = AdapterCredentials { key: "k".to_string(), secret: "s".to_string() };
        let result = adapter.enrich(&creds, &serde_json::json!({})).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("rate limited"));
    }
}
