pub mod models;
pub mod db;
pub mod error;
pub mod repositories;
pub mod store;

pub use sqlx;

pub use error::StoreError;
pub use models::usage_record::{NewUsageRecord, UsageRecord, normalize_license_id};
pub use repositories::usage_repo::UsageRepository;
pub use store::UsageStore;

/// Name of the single table the dashboard reads and appends to.
pub const USAGE_TABLE: &str = "license_usage_log";
