pub use super::api_credentials::Entity as ApiCredentials;
pub use super::billing_records::Entity as BillingRecords;
pub use super::credit_transactions::Entity as CreditTransactions;
pub use super::enrichment_jobs::Entity as EnrichmentJobs;
pub use super::enrichment_records::Entity as EnrichmentRecords;
pub use super::webhook_subscriptions::Entity as WebhookSubscriptions;
