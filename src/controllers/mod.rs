pub mod credentials;
pub mod credits;
pub mod jobs;
pub mod providers;
pub mod system;
pub mod webhooks;

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::services::errors::EnrichmentError;

/// Tenant scoping is carried on every request as `X-Workspace-Id` / `X-User-Id`. Request
/// authentication itself (JWT, RBAC) sits in front of this service and is out of scope here.
pub fn tenant_from_headers(headers: &HeaderMap) -> Result<(Uuid, Uuid), EnrichmentError> {
    let workspace_id = header_uuid(headers, "x-workspace-id")?;
    let user_id = header_uuid(headers, "x-user-id")?;
    Ok((workspace_id, user_id))
}

fn header_uuid(headers: &HeaderMap, name: &str) -> Result<Uuid, EnrichmentError> {
    let raw = headers
        .get(name)
        .ok_or_else(|| EnrichmentError::validation(format!("missing {name} header")))?
        .to_str()
        .map_err(|_| EnrichmentError::validation(format!("{name} header is not valid UTF-8")))?;

    Uuid::parse_str(raw).map_err(|_| EnrichmentError::validation(format!("{name} header is not a valid UUID")))
}
