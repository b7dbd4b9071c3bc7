// Dashboard page: full table, low-usage chart and details, duplicate IDs.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use licensewatch_db::{StoreError, USAGE_TABLE, UsageRecord};
use serde::Deserialize;
use tracing::error;

use crate::AppState;
use crate::services::ingest_service::UploadPreview;
use crate::services::usage_report::{
    DuplicateEntry, LicenseUsage, MAX_THRESHOLD, MIN_THRESHOLD, Threshold, UsageReport, UsageRow,
};
use crate::utils::{format_number, format_timestamp, number_or_blank, text_or_blank};

pub const PAGE_TITLE: &str = "Vector License Usage Dashboard";

// ============================================================================
// Templates
// ============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub title: &'static str,
    pub threshold: i64,
    pub min_threshold: i64,
    pub max_threshold: i64,
    pub clear_statement: String,
    pub rows: Vec<UsageRowView>,
    pub low_usage: Vec<LicenseUsageView>,
    pub chart_json: String,
    pub duplicates: Vec<DuplicateRowView>,
    pub notice: Option<Notice>,
    pub preview: Option<UploadPreview>,
}

#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub title: &'static str,
    pub message: String,
}

pub struct UsageRowView {
    pub license_id: String,
    pub vni_asset_number: String,
    pub project_name: String,
    pub domain_name: String,
    pub team_name: String,
    pub current_user_id: String,
    pub duration_days: String,
    pub duration_hours: String,
    pub uploaded_at: String,
}

pub struct LicenseUsageView {
    pub license_id: String,
    pub total_days: String,
    pub project_name: String,
    pub domain_name: String,
    pub team_name: String,
}

pub struct DuplicateRowView {
    pub license_id: String,
    pub vni_asset_number: String,
    pub project_name: String,
    pub domain_name: String,
    pub team_name: String,
    pub current_user_id: String,
    pub uploaded_at: String,
}

/// Banner shown above the views after an upload.
pub struct Notice {
    pub kind: &'static str,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: "success",
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: "error",
            message: message.into(),
        }
    }
}

impl From<&UsageRow> for UsageRowView {
    fn from(row: &UsageRow) -> Self {
        Self {
            license_id: row.license_id.clone(),
            vni_asset_number: text_or_blank(&row.vni_asset_number),
            project_name: text_or_blank(&row.project_name),
            domain_name: text_or_blank(&row.domain_name),
            team_name: text_or_blank(&row.team_name),
            current_user_id: text_or_blank(&row.current_user_id),
            duration_days: number_or_blank(row.duration_days),
            duration_hours: number_or_blank(row.duration_hours),
            uploaded_at: format_timestamp(&row.uploaded_at),
        }
    }
}

impl From<&LicenseUsage> for LicenseUsageView {
    fn from(usage: &LicenseUsage) -> Self {
        Self {
            license_id: usage.license_id.clone(),
            total_days: format_number(usage.total_days),
            project_name: text_or_blank(&usage.project_name),
            domain_name: text_or_blank(&usage.domain_name),
            team_name: text_or_blank(&usage.team_name),
        }
    }
}

impl From<&DuplicateEntry> for DuplicateRowView {
    fn from(entry: &DuplicateEntry) -> Self {
        Self {
            license_id: entry.license_id.clone(),
            vni_asset_number: text_or_blank(&entry.vni_asset_number),
            project_name: text_or_blank(&entry.project_name),
            domain_name: text_or_blank(&entry.domain_name),
            team_name: text_or_blank(&entry.team_name),
            current_user_id: text_or_blank(&entry.current_user_id),
            uploaded_at: format_timestamp(&entry.uploaded_at),
        }
    }
}

impl DashboardTemplate {
    pub fn new(report: &UsageReport, notice: Option<Notice>, preview: Option<UploadPreview>) -> Self {
        let chart_json = report
            .chart
            .as_ref()
            .and_then(|chart| serde_json::to_string(chart).ok())
            .unwrap_or_default();

        Self {
            title: PAGE_TITLE,
            threshold: report.threshold.days(),
            min_threshold: MIN_THRESHOLD,
            max_threshold: MAX_THRESHOLD,
            clear_statement: format!("DELETE FROM {};", USAGE_TABLE),
            rows: report.rows.iter().map(UsageRowView::from).collect(),
            low_usage: report.low_usage.iter().map(LicenseUsageView::from).collect(),
            chart_json,
            duplicates: report.duplicates.iter().map(DuplicateRowView::from).collect(),
            notice,
            preview,
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Query string for the report routes. The threshold arrives as raw text so
/// a cleared or non-numeric field falls back to the default.
#[derive(Debug, Default, Deserialize)]
pub struct ReportParams {
    pub threshold: Option<String>,
}

impl ReportParams {
    pub fn threshold(&self) -> Threshold {
        Threshold::clamped(
            self.threshold
                .as_deref()
                .and_then(|t| t.trim().parse::<i64>().ok()),
        )
    }
}

/// GET / - Dashboard for the requested threshold
pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Response {
    let threshold = params.threshold();

    let records = match load_records(&state).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    let report = UsageReport::build(&records, threshold);
    DashboardTemplate::new(&report, None, None).into_response()
}

/// Reads the whole usage log, or the error page when the database is
/// unreachable.
pub async fn load_records(state: &AppState) -> Result<Vec<UsageRecord>, Response> {
    state
        .store
        .load_all()
        .await
        .map_err(|e| database_unavailable(&e))
}

pub fn database_unavailable(err: &StoreError) -> Response {
    error!("Failed to load usage log: {}", err);
    (
        StatusCode::SERVICE_UNAVAILABLE,
        ErrorTemplate {
            title: PAGE_TITLE,
            message: format!("Failed to connect to database: {}", err),
        },
    )
        .into_response()
}
