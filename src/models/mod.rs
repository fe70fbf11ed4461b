pub mod _entities;

pub mod api_credential;
pub mod billing_record;
pub mod credit_transaction;
pub mod enrichment_job;
pub mod enrichment_record;
pub mod webhook_subscription;
