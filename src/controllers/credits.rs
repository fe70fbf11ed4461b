use axum::extract::{Query, State};
use axum::http::HeaderMap;
use loco_rs::prelude::*;
use serde::Deserialize;

use crate::controllers::jobs::PageParams;
use crate::controllers::tenant_from_headers;
use crate::services::credit_ledger::CreditLedger;

#[derive(Debug, Deserialize)]
pub struct AddCreditsPayload {
    pub amount: i64,
    pub description: String,
}

pub fn routes() -> Routes {
    Routes::new()
        .prefix("credits")
        .add("/", get(get_billing))
        .add("/add", post(add_credits))
        .add("/transactions", get(list_transactions))
}

async fn get_billing(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> Result<Json<crate::models::billing_record::BillingRecord>> {
    let (workspace_id, _user_id) = tenant_from_headers(&headers).map_err(loco_rs::Error::from)?;

    let billing = CreditLedger::get_billing(&ctx.db, workspace_id).await.map_err(loco_rs::Error::from)?;
    format::json(billing)
}

async fn add_credits(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(payload): Json<AddCreditsPayload>,
) -> Result<Json<crate::models::credit_transaction::CreditTransaction>> {
    let (workspace_id, _user_id) = tenant_from_headers(&headers).map_err(loco_rs::Error::from)?;

    let transaction = CreditLedger::add_credits(&ctx.db, workspace_id, payload.amount, payload.description)
        .await
        .map_err(loco_rs::Error::from)?;

    format::json(transaction)
}

async fn list_transactions(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> Result<Json<serde_json::Value>> {
    let (workspace_id, _user_id) = tenant_from_headers(&headers).map_err(loco_rs::Error::from)?;

    let (transactions, total_pages) = CreditLedger::get_transactions(
        &ctx.db,
        workspace_id,
        params.page.unwrap_or(1),
        params.per_page.unwrap_or(20),
    )
    .await
    .map_err(loco_rs::Error::from)?;

    format::json(serde_json::json!({ "transactions": transactions, "totalPages": total_pages }))
}
