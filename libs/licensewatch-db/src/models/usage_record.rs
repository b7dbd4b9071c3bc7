use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row of `license_usage_log` as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UsageRecord {
    pub id: i64,
    pub vni_asset_number: Option<String>,
    pub license_id: Option<String>,
    pub project_name: Option<String>,
    pub domain_name: Option<String>,
    pub team_name: Option<String>,
    pub current_user_id: Option<String>,
    pub duration_days: Option<f64>,
    pub duration_hours: Option<f64>,
    pub uploaded_at: DateTime<Utc>,
}

/// A usage event waiting to be appended. `id` and `uploaded_at` are
/// assigned by the database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewUsageRecord {
    pub vni_asset_number: Option<String>,
    pub license_id: Option<String>,
    pub project_name: Option<String>,
    pub domain_name: Option<String>,
    pub team_name: Option<String>,
    pub current_user_id: Option<String>,
    pub duration_days: Option<f64>,
    pub duration_hours: Option<f64>,
}

impl UsageRecord {
    /// The license ID in canonical integer form, or `None` when the stored
    /// value does not parse as a number.
    pub fn normalized_license_id(&self) -> Option<String> {
        self.license_id.as_deref().and_then(normalize_license_id)
    }
}

/// Canonicalises a license identifier: parse as a number, truncate toward
/// zero and print as an integer. `"5"`, `"5.0"` and `"5.9"` all become
/// `"5"`. Non-finite values and values outside the `i64` range are rejected.
pub fn normalize_license_id(raw: &str) -> Option<String> {
    let value: f64 = raw.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    let truncated = value.trunc();
    // i64::MAX is not representable as f64; the cast below saturates, so
    // bound the range explicitly.
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return None;
    }
    Some((truncated as i64).to_string())
}
