pub mod enrichment_workflow;
