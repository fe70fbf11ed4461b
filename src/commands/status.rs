use std::collections::BTreeMap;

use async_trait::async_trait;
use loco_rs::app::AppContext;
use loco_rs::task::{Task, TaskInfo};
use loco_rs::Result;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use crate::models::_entities::prelude::*;
use crate::models::enrichment_job::JobStatus;

/// Read-only operational snapshot: job counts by status and aggregate credit balance across
/// every workspace. Run with `cargo loco task status`.
pub struct StatusTask;

#[async_trait]
impl Task for StatusTask {
    fn task(&self) -> TaskInfo {
        TaskInfo {
            name: "status".to_string(),
            detail: "Print job counts by status and aggregate billing totals".to_string(),
        }
    }

    async fn run(&self, app_context: &AppContext, _vars: &BTreeMap<String, String>) -> Result<()> {
        let db = &app_context.db;

        for status in [
            JobStatus::Pending,
            JobStatus::Running,
            JobStatus::Completed,
            JobStatus::Failed,
            JobStatus::PartiallyCompleted,
            JobStatus::Cancelled,
        ] {
            let count = EnrichmentJobs::find()
                .filter(crate::models::_entities::enrichment_jobs::Column::Status.eq(status.to_string()))
                .count(db)
                .await?;
            println!("{:>20}: {count}", status.to_string());
        }

        let billing = BillingRecords::find().all(db).await?;
        let total_balance: i64 = billing.iter().map(|b| b.credit_balance).sum();
        println!("{:>20}: {}", "workspaces", billing.len());
        println!("{:>20}: {total_balance}", "total credit balance");

        Ok(())
    }
}
