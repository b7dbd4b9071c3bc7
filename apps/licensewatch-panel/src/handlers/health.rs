use crate::AppState;
use axum::{Json, extract::State};
use serde_json::{Value, json};
use tracing::warn;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let database = match state.store.ping().await {
        Ok(_) => "ok",
        Err(e) => {
            warn!("Health check could not reach the database: {}", e);
            "unreachable"
        }
    };

    Json(json!({
        "status": "ok",
        "database": database,
        "version": env!("CARGO_PKG_VERSION")
    }))
}
