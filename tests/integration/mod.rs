mod enrichment_activity_test;
mod requests;
