use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use loco_rs::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use crate::controllers::tenant_from_headers;
use crate::services::enrichment_service::{CreateJobRequest, EnrichmentService};
use crate::services::provider_registry::ProviderRegistry;

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

pub fn routes() -> Routes {
    Routes::new()
        .prefix("jobs")
        .add("/", post(create))
        .add("/", get(list))
        .add("/:id", get(get_one))
        .add("/:id/cancel", post(cancel))
        .add("/:id/records", get(list_records))
}

async fn create(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(request): Json<CreateJobRequest>,
) -> Result<Json<crate::models::enrichment_job::EnrichmentJob>> {
    let (workspace_id, user_id) = tenant_from_headers(&headers).map_err(loco_rs::Error::from)?;

    // The registry is a process-wide, read-only catalog; constructing it is cheap and keeps
    // request handling independent of any shared mutable state beyond the database.
    let registry = ProviderRegistry::default_registry();

    let job = EnrichmentService::create_job(&ctx, &registry, workspace_id, user_id, request)
        .await
        .map_err(loco_rs::Error::from)?;

    format::json(job)
}

async fn list(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> Result<Json<serde_json::Value>> {
    let (workspace_id, _user_id) = tenant_from_headers(&headers).map_err(loco_rs::Error::from)?;

    let (jobs, total_pages) =
        EnrichmentService::list_jobs(&ctx.db, workspace_id, params.page.unwrap_or(1), params.per_page.unwrap_or(20))
            .await
            .map_err(loco_rs::Error::from)?;

    format::json(serde_json::json!({ "jobs": jobs, "totalPages": total_pages }))
}

async fn get_one(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<crate::models::enrichment_job::EnrichmentJob>> {
    let (workspace_id, _user_id) = tenant_from_headers(&headers).map_err(loco_rs::Error::from)?;

    let job = EnrichmentService::get_job(&ctx.db, workspace_id, id).await.map_err(loco_rs::Error::from)?;
    format::json(job)
}

async fn cancel(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<crate::models::enrichment_job::EnrichmentJob>> {
    let (workspace_id, _user_id) = tenant_from_headers(&headers).map_err(loco_rs::Error::from)?;

    let job = EnrichmentService::cancel_job(&ctx.db, workspace_id, id).await.map_err(loco_rs::Error::from)?;
    format::json(job)
}

async fn list_records(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<Json<serde_json::Value>> {
    let (workspace_id, _user_id) = tenant_from_headers(&headers).map_err(loco_rs::Error::from)?;

    // Confirm the job belongs to this workspace before exposing its records.
    EnrichmentService::get_job(&ctx.db, workspace_id, id).await.map_err(loco_rs::Error::from)?;

    let (records, total_pages) =
        EnrichmentService::list_records(&ctx.db, id, params.page.unwrap_or(1), params.per_page.unwrap_or(20))
            .await
            .map_err(loco_rs::Error::from)?;

    format::json(serde_json::json!({ "records": records, "totalPages": total_pages }))
}
