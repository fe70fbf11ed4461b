use async_trait::async_trait;
use loco_rs::{
    app::{AppContext, Hooks},
    boot::{create_app, BootResult, StartMode},
    controller::AppRoutes,
    environment::Environment,
    task::Tasks,
    worker::Processor,
    Result,
};
use migration::Migrator;
use sea_orm::DatabaseConnection;

use crate::{controllers, workers};

pub struct App;

#[async_trait]
impl Hooks for App {
    fn app_name() -> &'static str {
        env!("CARGO_CRATE_NAME")
    }

    fn app_version() -> String {
        format!(
            "{} ({})",
            env!("CARGO_PKG_VERSION"),
            option_env!("BUILD_SHA").or(option_env!("GITHUB_SHA")).unwrap_or("dev")
        )
    }

    async fn boot(mode: StartMode, environment: &Environment) -> Result<BootResult> {
        create_app::<Self, Migrator>(mode, environment).await
    }

    async fn truncate(db: &DatabaseConnection) -> Result<()> {
        use crate::seeders::DatabaseSeeder;
        DatabaseSeeder::clear_all(db).await?;
        Ok(())
    }

    async fn seed(db: &DatabaseConnection, _base: &std::path::Path) -> Result<()> {
        use crate::seeders::DatabaseSeeder;

        if std::env::var("LOCO_ENV").unwrap_or_else(|_| "development".to_string()) == "development" {
            if !DatabaseSeeder::is_seeded(db).await? {
                tracing::info!("seeding development database");
                DatabaseSeeder::seed_development(db).await?;
            } else {
                tracing::info!("database already seeded, skipping");
            }
        }

        Ok(())
    }

    fn routes(_ctx: &AppContext) -> AppRoutes {
        AppRoutes::with_default_routes()
            .prefix("/api")
            .add_route(controllers::jobs::routes())
            .add_route(controllers::credentials::routes())
            .add_route(controllers::credits::routes())
            .add_route(controllers::webhooks::routes())
            .add_route(controllers::providers::routes())
            .add_route(controllers::system::routes())
    }

    fn connect_workers<'a>(p: &'a mut Processor, ctx: &'a AppContext) {
        p.register(workers::enrichment_workflow::EnrichmentWorkflowWorker::build(ctx));
    }

    fn register_tasks(tasks: &mut Tasks) {
        tasks.register(crate::commands::status::StatusTask);
    }
}
