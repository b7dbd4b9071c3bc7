use axum::{
    body::Bytes,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use super::dashboard::{DashboardTemplate, Notice, load_records};
use crate::AppState;
use crate::services::ingest_service::{IngestError, PREVIEW_ROWS, UploadedTable, ingest};
use crate::services::usage_report::{Threshold, UsageReport};

/// POST /upload - Append a CSV export to the usage log
///
/// Form fields: `file` (the CSV) and optionally `threshold`, so the page
/// re-renders with the operator's current filter.
pub async fn post_upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut threshold = None;
    let mut upload: Option<(String, Bytes)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read upload form: {}", e);
                return (e.status(), e.body_text()).into_response();
            }
        };

        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("threshold") => {
                if let Ok(text) = field.text().await {
                    threshold = text.trim().parse::<i64>().ok();
                }
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload.csv").to_string();
                match field.bytes().await {
                    Ok(bytes) => upload = Some((file_name, bytes)),
                    Err(e) => {
                        warn!("Failed to read uploaded file {}: {}", file_name, e);
                        return (e.status(), e.body_text()).into_response();
                    }
                }
            }
            _ => {}
        }
    }

    let threshold = Threshold::clamped(threshold);

    let records = match load_records(&state).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    let Some((file_name, bytes)) = upload.filter(|(_, b)| !b.is_empty()) else {
        let report = UsageReport::build(&records, threshold);
        return (
            StatusCode::BAD_REQUEST,
            DashboardTemplate::new(&report, Some(Notice::error("No file uploaded")), None),
        )
            .into_response();
    };

    info!("Received upload {} ({} bytes)", file_name, bytes.len());

    let table = match UploadedTable::from_csv(&bytes) {
        Ok(t) => t,
        Err(e) => {
            warn!("Rejected upload {}: {}", file_name, e);
            let report = UsageReport::build(&records, threshold);
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                DashboardTemplate::new(&report, Some(Notice::error(e.to_string())), None),
            )
                .into_response();
        }
    };
    let preview = Some(table.preview(PREVIEW_ROWS));

    match ingest(state.store.as_ref(), &table).await {
        Ok(inserted) => {
            // Re-read so the views include the rows just appended.
            let records = match load_records(&state).await {
                Ok(r) => r,
                Err(resp) => return resp,
            };
            let report = UsageReport::build(&records, threshold);
            let notice = Notice::success(format!("Uploaded {} records to database.", inserted));
            DashboardTemplate::new(&report, Some(notice), preview).into_response()
        }
        Err(e) => {
            let status = match e {
                IngestError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
                IngestError::MissingColumns(_) | IngestError::Malformed(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
            };
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                warn!("Upload {} discarded: {}", file_name, e);
            }
            let report = UsageReport::build(&records, threshold);
            (
                status,
                DashboardTemplate::new(&report, Some(Notice::error(e.to_string())), preview),
            )
                .into_response()
        }
    }
}
