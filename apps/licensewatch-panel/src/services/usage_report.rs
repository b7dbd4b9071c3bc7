//! Read-only aggregations behind the dashboard: the filtered usage table,
//! per-license totals below a threshold, and repeated license IDs.
//!
//! Everything is recomputed from the full record list on every request.

use chrono::{DateTime, Utc};
use licensewatch_db::UsageRecord;
use serde::Serialize;
use std::collections::HashMap;

pub const MIN_THRESHOLD: i64 = 1;
pub const MAX_THRESHOLD: i64 = 30;
pub const DEFAULT_THRESHOLD: i64 = 6;

/// Low-usage cutoff in days, always within `MIN_THRESHOLD..=MAX_THRESHOLD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Threshold(i64);

impl Threshold {
    pub fn clamped(raw: Option<i64>) -> Self {
        Self(
            raw.unwrap_or(DEFAULT_THRESHOLD)
                .clamp(MIN_THRESHOLD, MAX_THRESHOLD),
        )
    }

    pub fn days(self) -> i64 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD)
    }
}

/// A stored record whose license ID parsed, with the ID in canonical form.
#[derive(Debug, Clone, Serialize)]
pub struct UsageRow {
    #[serde(skip)]
    license_key: i64,
    pub license_id: String,
    pub vni_asset_number: Option<String>,
    pub project_name: Option<String>,
    pub domain_name: Option<String>,
    pub team_name: Option<String>,
    pub current_user_id: Option<String>,
    pub duration_days: Option<f64>,
    pub duration_hours: Option<f64>,
    pub uploaded_at: DateTime<Utc>,
}

impl UsageRow {
    pub fn from_record(record: &UsageRecord) -> Option<Self> {
        let license_id = record.normalized_license_id()?;
        let license_key = license_id.parse().ok()?;
        Some(Self {
            license_key,
            license_id,
            vni_asset_number: record.vni_asset_number.clone(),
            project_name: record.project_name.clone(),
            domain_name: record.domain_name.clone(),
            team_name: record.team_name.clone(),
            current_user_id: record.current_user_id.clone(),
            duration_days: record.duration_days,
            duration_hours: record.duration_hours,
            uploaded_at: record.uploaded_at,
        })
    }
}

/// Summed usage of one license plus the metadata of its first row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LicenseUsage {
    #[serde(skip)]
    license_key: i64,
    pub license_id: String,
    pub total_days: f64,
    pub project_name: Option<String>,
    pub domain_name: Option<String>,
    pub team_name: Option<String>,
}

/// A row of the duplicate listing; durations are left out.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateEntry {
    pub license_id: String,
    pub vni_asset_number: Option<String>,
    pub project_name: Option<String>,
    pub domain_name: Option<String>,
    pub team_name: Option<String>,
    pub current_user_id: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<&UsageRow> for DuplicateEntry {
    fn from(row: &UsageRow) -> Self {
        Self {
            license_id: row.license_id.clone(),
            vni_asset_number: row.vni_asset_number.clone(),
            project_name: row.project_name.clone(),
            domain_name: row.domain_name.clone(),
            team_name: row.team_name.clone(),
            current_user_id: row.current_user_id.clone(),
            uploaded_at: row.uploaded_at,
        }
    }
}

/// Bar chart of the low-usage licenses, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub y_min: f64,
    pub y_max: f64,
}

impl ChartData {
    fn for_low_usage(low_usage: &[LicenseUsage], threshold: Threshold) -> Option<Self> {
        let max_total = low_usage
            .iter()
            .map(|l| l.total_days)
            .reduce(f64::max)?;

        Some(Self {
            title: format!(
                "Total Usage Duration (Days) per License ID [< {} days]",
                threshold.days()
            ),
            labels: low_usage.iter().map(|l| l.license_id.clone()).collect(),
            values: low_usage.iter().map(|l| l.total_days).collect(),
            y_min: -0.5,
            y_max: max_total + 1.0,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    pub threshold: Threshold,
    pub rows: Vec<UsageRow>,
    pub low_usage: Vec<LicenseUsage>,
    pub chart: Option<ChartData>,
    pub duplicates: Vec<DuplicateEntry>,
}

impl UsageReport {
    pub fn build(records: &[UsageRecord], threshold: Threshold) -> Self {
        let rows: Vec<UsageRow> = records.iter().filter_map(UsageRow::from_record).collect();
        let low_usage = low_usage(totals_by_license(&rows), threshold);
        let chart = ChartData::for_low_usage(&low_usage, threshold);
        let duplicates = duplicate_entries(&rows);

        Self {
            threshold,
            rows,
            low_usage,
            chart,
            duplicates,
        }
    }
}

/// Sums `duration_days` per license in first-seen order. Missing durations
/// count as zero.
pub fn totals_by_license(rows: &[UsageRow]) -> Vec<LicenseUsage> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<LicenseUsage> = Vec::new();

    for row in rows {
        let days = row.duration_days.filter(|d| !d.is_nan()).unwrap_or(0.0);
        match index.get(row.license_id.as_str()) {
            Some(&i) => totals[i].total_days += days,
            None => {
                index.insert(row.license_id.as_str(), totals.len());
                totals.push(LicenseUsage {
                    license_key: row.license_key,
                    license_id: row.license_id.clone(),
                    total_days: days,
                    project_name: row.project_name.clone(),
                    domain_name: row.domain_name.clone(),
                    team_name: row.team_name.clone(),
                });
            }
        }
    }

    totals
}

/// Licenses whose total is strictly below the threshold, lowest first.
pub fn low_usage(totals: Vec<LicenseUsage>, threshold: Threshold) -> Vec<LicenseUsage> {
    let cutoff = threshold.days() as f64;
    let mut low: Vec<LicenseUsage> = totals
        .into_iter()
        .filter(|l| l.total_days < cutoff)
        .collect();
    low.sort_by(|a, b| {
        a.total_days
            .total_cmp(&b.total_days)
            .then(a.license_key.cmp(&b.license_key))
    });
    low
}

/// Every row whose license ID occurs more than once, ordered by license ID.
pub fn duplicate_entries(rows: &[UsageRow]) -> Vec<DuplicateEntry> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        *counts.entry(row.license_id.as_str()).or_default() += 1;
    }

    let mut repeated: Vec<&UsageRow> = rows
        .iter()
        .filter(|row| counts.get(row.license_id.as_str()).copied().unwrap_or(0) > 1)
        .collect();
    // stable: store order within one license
    repeated.sort_by_key(|row| row.license_key);
    repeated.into_iter().map(DuplicateEntry::from).collect()
}
