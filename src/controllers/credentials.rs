use axum::extract::{Path, State};
use axum::http::HeaderMap;
use loco_rs::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use crate::controllers::tenant_from_headers;
use crate::services::config_service::ConfigService;
use crate::services::credential_vault::CredentialVault;

#[derive(Debug, Deserialize)]
pub struct StoreCredentialPayload {
    pub provider_name: String,
    pub key: String,
    pub secret: String,
}

pub fn routes() -> Routes {
    Routes::new()
        .prefix("credentials")
        .add("/", post(store))
        .add("/", get(list))
        .add("/:id", delete(remove))
}

fn vault() -> Result<CredentialVault> {
    let master_key = ConfigService::master_encryption_key()?;
    CredentialVault::new(&master_key).map_err(loco_rs::Error::from)
}

async fn store(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(payload): Json<StoreCredentialPayload>,
) -> Result<Json<crate::services::credential_vault::MaskedCredential>> {
    let (workspace_id, user_id) = tenant_from_headers(&headers).map_err(loco_rs::Error::from)?;

    let credential = vault()?
        .store(&ctx.db, workspace_id, &payload.provider_name, &payload.key, &payload.secret, user_id)
        .await
        .map_err(loco_rs::Error::from)?;

    format::json(crate::services::credential_vault::MaskedCredential {
        id: credential.id,
        provider_name: credential.provider_name,
        masked_key: CredentialVault::mask(&payload.key),
        created_at: credential.created_at,
        last_used_at: credential.last_used_at,
    })
}

async fn list(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> Result<Json<Vec<crate::services::credential_vault::MaskedCredential>>> {
    let (workspace_id, _user_id) = tenant_from_headers(&headers).map_err(loco_rs::Error::from)?;

    let credentials = vault()?.list(&ctx.db, workspace_id).await.map_err(loco_rs::Error::from)?;
    format::json(credentials)
}

async fn remove(State(ctx): State<AppContext>, headers: HeaderMap, Path(id): Path<Uuid>) -> Result<Json<serde_json::Value>> {
    let (workspace_id, _user_id) = tenant_from_headers(&headers).map_err(loco_rs::Error::from)?;

    // Deletion is scoped by checking the credential's listed ownership first.
    let owned = vault()?.list(&ctx.db, workspace_id).await.map_err(loco_rs::Error::from)?;
    if !owned.iter().any(|c| c.id == id) {
        return Err(loco_rs::Error::string("Credential not found"));
    }

    vault()?.delete_credential(&ctx.db, id).await.map_err(loco_rs::Error::from)?;
    format::json(serde_json::json!({ "deleted": true }))
}
