use loco_rs::prelude::*;

use crate::services::provider_registry::ProviderRegistry;

pub fn routes() -> Routes {
    Routes::new().prefix("providers").add("/", get(list))
}

/// Read-only view of the process-wide provider catalog — no per-workspace data.
async fn list() -> Result<Json<Vec<crate::services::provider_registry::ProviderDefinition>>> {
    let registry = ProviderRegistry::default_registry();
    let providers: Vec<_> = registry.get_all_providers().into_iter().cloned().collect();
    format::json(providers)
}
