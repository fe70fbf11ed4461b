use axum::extract::State;
use axum::http::HeaderMap;
use loco_rs::prelude::*;
use serde::Deserialize;

use crate::controllers::tenant_from_headers;
use crate::services::webhook_service::WebhookService;

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionPayload {
    pub callback_url: String,
    pub event_types: Vec<String>,
}

pub fn routes() -> Routes {
    Routes::new()
        .prefix("webhooks")
        .add("/", post(create))
        .add("/", get(list))
}

async fn create(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(payload): Json<CreateSubscriptionPayload>,
) -> Result<Json<crate::models::webhook_subscription::WebhookSubscription>> {
    let (workspace_id, user_id) = tenant_from_headers(&headers).map_err(loco_rs::Error::from)?;

    let subscription =
        WebhookService::create_subscription(&ctx.db, workspace_id, user_id, payload.callback_url, payload.event_types)
            .await?;

    format::json(subscription)
}

async fn list(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> Result<Json<Vec<crate::models::webhook_subscription::WebhookSubscription>>> {
    let (workspace_id, _user_id) = tenant_from_headers(&headers).map_err(loco_rs::Error::from)?;

    let subscriptions =
        crate::models::webhook_subscription::WebhookSubscription::list_by_workspace(&ctx.db, workspace_id).await?;

    format::json(subscriptions)
}
