use enrichment_orchestrator::app::App;
use loco_rs::testing;
use migration::Migrator;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn providers_catalog_is_reachable_without_a_tenant() {
    testing::request::<App, Migrator, _, _>(|request, _ctx| async move {
        let res = request.get("/api/providers/").await;
        res.assert_status_ok();
    })
    .await;
}

#[tokio::test]
#[serial]
async fn version_endpoint_reports_the_crate_version() {
    testing::request::<App, Migrator, _, _>(|request, _ctx| async move {
        let res = request.get("/api/system/version").await;
        res.assert_status_ok();
        let body: serde_json::Value = res.json();
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    })
    .await;
}

#[tokio::test]
#[serial]
async fn job_creation_without_tenant_headers_is_rejected() {
    testing::request::<App, Migrator, _, _>(|request, _ctx| async move {
        let res = request
            .post("/api/jobs/")
            .json(&serde_json::json!({ "records": [], "fields": [] }))
            .await;
        assert!(res.status_code().is_client_error());
    })
    .await;
}
