use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::usage_record::{NewUsageRecord, UsageRecord};

/// Persistence seam for the usage log.
///
/// The dashboard only ever reads the whole table or appends to it, so this
/// is the entire surface. Implementations must be shareable across request
/// tasks.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Every stored row, oldest first.
    async fn load_all(&self) -> Result<Vec<UsageRecord>, StoreError>;

    /// Appends `rows` atomically and returns how many were written.
    async fn append(&self, rows: &[NewUsageRecord]) -> Result<u64, StoreError>;

    /// Issues a trivial query and returns its result.
    async fn ping(&self) -> Result<i32, StoreError>;

    async fn server_version(&self) -> Result<String, StoreError>;
}
