pub mod circuit_breaker;
pub mod config_service;
pub mod credential_vault;
pub mod credit_ledger;
pub mod enrichment_activity;
pub mod enrichment_service;
pub mod errors;
pub mod provider_adapters;
pub mod provider_registry;
pub mod webhook_service;
