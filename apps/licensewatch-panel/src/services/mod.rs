pub mod ingest_service;
pub mod usage_report;
