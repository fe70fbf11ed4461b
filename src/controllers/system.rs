use axum::extract::State;
use loco_rs::prelude::*;
use serde_json::json;

pub fn routes() -> Routes {
    Routes::new().prefix("system").add("/health", get(health)).add("/version", get(version))
}

async fn health(State(ctx): State<AppContext>) -> Result<Json<serde_json::Value>> {
    let db_ok = ctx.db.ping().await.is_ok();

    format::json(json!({
        "status": if db_ok { "healthy" } else { "degraded" },
        "database": db_ok,
    }))
}

async fn version() -> Result<Json<serde_json::Value>> {
    format::json(json!({
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
