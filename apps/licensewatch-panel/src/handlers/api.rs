use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use super::dashboard::ReportParams;
use crate::AppState;
use crate::services::usage_report::UsageReport;

/// GET /api/report - The dashboard views as JSON
pub async fn get_report(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Response {
    let threshold = params.threshold();

    match state.store.load_all().await {
        Ok(records) => Json(UsageReport::build(&records, threshold)).into_response(),
        Err(e) => {
            error!("Failed to load usage log: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": format!("Failed to connect to database: {}", e) })),
            )
                .into_response()
        }
    }
}
