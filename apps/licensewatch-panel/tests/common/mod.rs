#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use licensewatch_db::sqlx;
use licensewatch_db::{NewUsageRecord, StoreError, UsageRecord, UsageStore};
use licensewatch_panel::{AppState, build_router};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

pub const HEADER: &str = "vni_asset_number,license_id,project_name,domain_name,team_name,current_user_id,duration_days,duration_hours";

const BOUNDARY: &str = "licensewatch-test-boundary";

/// In-memory `UsageStore` with switchable failure modes.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<UsageRecord>>,
    pub fail_reads: bool,
    pub fail_inserts: bool,
}

impl MemoryStore {
    pub fn seeded(rows: &[NewUsageRecord]) -> Self {
        let store = Self::default();
        store.push_all(rows);
        store
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn rows(&self) -> Vec<UsageRecord> {
        self.rows.lock().unwrap().clone()
    }

    fn push_all(&self, rows: &[NewUsageRecord]) {
        let mut stored = self.rows.lock().unwrap();
        for row in rows {
            let id = stored.len() as i64 + 1;
            stored.push(UsageRecord {
                id,
                vni_asset_number: row.vni_asset_number.clone(),
                license_id: row.license_id.clone(),
                project_name: row.project_name.clone(),
                domain_name: row.domain_name.clone(),
                team_name: row.team_name.clone(),
                current_user_id: row.current_user_id.clone(),
                duration_days: row.duration_days,
                duration_hours: row.duration_hours,
                uploaded_at: Utc::now(),
            });
        }
    }
}

#[async_trait]
impl UsageStore for MemoryStore {
    async fn load_all(&self) -> Result<Vec<UsageRecord>, StoreError> {
        if self.fail_reads {
            return Err(StoreError::Connection(sqlx::Error::PoolTimedOut));
        }
        Ok(self.rows())
    }

    async fn append(&self, rows: &[NewUsageRecord]) -> Result<u64, StoreError> {
        if self.fail_inserts {
            return Err(StoreError::Insert(sqlx::Error::PoolClosed));
        }
        self.push_all(rows);
        Ok(rows.len() as u64)
    }

    async fn ping(&self) -> Result<i32, StoreError> {
        if self.fail_reads {
            return Err(StoreError::Connection(sqlx::Error::PoolTimedOut));
        }
        Ok(1)
    }

    async fn server_version(&self) -> Result<String, StoreError> {
        Ok("PostgreSQL 16.0 (memory)".to_string())
    }
}

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub app: axum::Router,
}

pub fn build_test_context(store: MemoryStore) -> TestContext {
    build_test_context_with_limit(store, 1024 * 1024)
}

pub fn build_test_context_with_limit(store: MemoryStore, max_upload_bytes: usize) -> TestContext {
    let store = Arc::new(store);
    let state = AppState::new(store.clone(), max_upload_bytes);
    TestContext {
        store,
        app: build_router(state),
    }
}

pub fn usage(license_id: &str, days: f64) -> NewUsageRecord {
    NewUsageRecord {
        vni_asset_number: Some(format!("VNI-{license_id}")),
        license_id: Some(license_id.to_string()),
        project_name: Some("alpha".to_string()),
        domain_name: Some("adas".to_string()),
        team_name: Some("validation".to_string()),
        current_user_id: Some("operator".to_string()),
        duration_days: Some(days),
        duration_hours: Some(days * 24.0),
    }
}

pub fn multipart_upload(file_contents: &str, threshold: Option<i64>) -> (String, String) {
    let mut body = String::new();
    if let Some(t) = threshold {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"threshold\"\r\n\r\n{t}\r\n"
        ));
    }
    body.push_str(&format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"export.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n{file_contents}\r\n"
    ));
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

pub async fn get(app: &axum::Router, uri: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, req).await
}

pub async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(app, uri).await;
    let value = serde_json::from_str(&body).unwrap_or(Value::Null);
    (status, value)
}

pub async fn post_upload(app: &axum::Router, file_contents: &str, threshold: Option<i64>) -> (StatusCode, String) {
    let (content_type, body) = multipart_upload(file_contents, threshold);
    let req = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap();
    send(app, req).await
}

async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, String) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8_lossy(&bytes).to_string())
}
