mod common;

use axum::http::StatusCode;
use common::{HEADER, MemoryStore, build_test_context, build_test_context_with_limit, usage};

#[tokio::test]
async fn dashboard_renders_all_three_views() {
    let ctx = build_test_context(MemoryStore::seeded(&[
        usage("5", 2.0),
        usage("5", 1.0),
        usage("7", 10.0),
    ]));

    let (status, body) = common::get(&ctx.app, "/?threshold=6").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Vector License Usage Dashboard"));
    assert!(body.contains("Full License Usage Table"));
    assert!(body.contains("Licenses with Total Usage &lt; 6 Days"));
    assert!(body.contains("Duplicate License ID Entries"));
    assert!(body.contains("DELETE FROM license_usage_log;"));
    assert!(body.contains("low-usage-chart"));
}

#[tokio::test]
async fn dashboard_reports_when_nothing_is_below_threshold() {
    let ctx = build_test_context(MemoryStore::seeded(&[usage("7", 10.0)]));

    let (status, body) = common::get(&ctx.app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No licenses with total usage less than 6 days."));
    assert!(body.contains("No duplicate license IDs found."));
    assert!(!body.contains("low-usage-chart"));
}

#[tokio::test]
async fn report_api_matches_documented_example() {
    let ctx = build_test_context(MemoryStore::seeded(&[
        usage("5", 2.0),
        usage("5", 1.0),
        usage("7", 10.0),
    ]));

    let (status, json) = common::get_json(&ctx.app, "/api/report?threshold=6").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["threshold"], 6);
    assert_eq!(json["rows"].as_array().unwrap().len(), 3);

    let low = json["low_usage"].as_array().unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0]["license_id"], "5");
    assert_eq!(low[0]["total_days"], 3.0);
    assert_eq!(low[0]["project_name"], "alpha");

    let dups = json["duplicates"].as_array().unwrap();
    assert_eq!(dups.len(), 2);
    assert!(dups.iter().all(|d| d["license_id"] == "5"));
    assert_eq!(json["chart"]["y_max"], 4.0);
}

#[tokio::test]
async fn threshold_is_clamped_to_allowed_range() {
    let ctx = build_test_context(MemoryStore::default());

    let (_, high) = common::get_json(&ctx.app, "/api/report?threshold=99").await;
    assert_eq!(high["threshold"], 30);

    let (_, low) = common::get_json(&ctx.app, "/api/report?threshold=0").await;
    assert_eq!(low["threshold"], 1);

    let (_, default) = common::get_json(&ctx.app, "/api/report").await;
    assert_eq!(default["threshold"], 6);
}

#[tokio::test]
async fn cleared_threshold_field_uses_default() {
    let ctx = build_test_context(MemoryStore::seeded(&[usage("5", 2.0)]));

    let (status, body) = common::get(&ctx.app, "/?threshold=").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Licenses with Total Usage &lt; 6 Days"));

    let (status, json) = common::get_json(&ctx.app, "/api/report?threshold=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["threshold"], 6);

    let (status, json) = common::get_json(&ctx.app, "/api/report?threshold=abc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["threshold"], 6);

    let (_, json) = common::get_json(&ctx.app, "/api/report?threshold=%2012%20").await;
    assert_eq!(json["threshold"], 12);
}

#[tokio::test]
async fn upload_appends_every_row_including_unparseable_ones() {
    let ctx = build_test_context(MemoryStore::seeded(&[usage("7", 10.0)]));
    let csv = format!(
        "{HEADER}\n\
         VNI-1,5,alpha,adas,val,u1,2,48\n\
         VNI-2,not-a-number,beta,adas,val,u2,1,24\n\
         VNI-3,5,alpha,adas,val,u3,oops,"
    );

    let (status, body) = common::post_upload(&ctx.app, &csv, Some(6)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Uploaded 3 records to database."));
    assert!(body.contains("Preview of Uploaded Data"));
    assert!(body.contains("not-a-number"));
    assert_eq!(ctx.store.len(), 4);

    let stored = ctx.store.rows();
    assert_eq!(stored[2].license_id, None);
    assert_eq!(stored[3].duration_days, None);
    assert_eq!(stored[3].duration_hours, None);

    let (_, json) = common::get_json(&ctx.app, "/api/report?threshold=6").await;
    let low = json["low_usage"].as_array().unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0]["license_id"], "5");
    assert_eq!(low[0]["total_days"], 2.0);
}

#[tokio::test]
async fn upload_missing_a_column_leaves_store_untouched() {
    let ctx = build_test_context(MemoryStore::seeded(&[usage("7", 10.0)]));
    let csv = "vni_asset_number,license_id,project_name\nVNI-1,5,alpha";

    let (status, body) = common::post_upload(&ctx.app, csv, None).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("CSV is missing one or more required columns"));
    assert!(body.contains("duration_hours"));
    assert_eq!(ctx.store.len(), 1);
}

#[tokio::test]
async fn insert_failure_is_shown_and_prior_data_kept() {
    let mut store = MemoryStore::seeded(&[usage("7", 10.0)]);
    store.fail_inserts = true;
    let ctx = build_test_context(store);
    let csv = format!("{HEADER}\nVNI-1,5,alpha,adas,val,u1,2,48");

    let (status, body) = common::post_upload(&ctx.app, &csv, None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("Failed to insert into database"));
    assert!(body.contains("VNI-7"));
    assert_eq!(ctx.store.len(), 1);
}

#[tokio::test]
async fn upload_without_file_is_rejected() {
    let ctx = build_test_context(MemoryStore::default());

    let (status, body) = common::post_upload(&ctx.app, "", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("No file uploaded"));
}

#[tokio::test]
async fn oversized_upload_is_refused() {
    let ctx = build_test_context_with_limit(MemoryStore::default(), 256);
    let rows: Vec<String> = (0..50)
        .map(|i| format!("VNI-{i},{i},alpha,adas,val,u{i},1,24"))
        .collect();
    let csv = format!("{HEADER}\n{}", rows.join("\n"));

    let (status, _) = common::post_upload(&ctx.app, &csv, None).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(ctx.store.len(), 0);
}

#[tokio::test]
async fn unreachable_database_halts_rendering() {
    let mut store = MemoryStore::default();
    store.fail_reads = true;
    let ctx = build_test_context(store);

    let (status, body) = common::get(&ctx.app, "/").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.contains("Failed to connect to database"));
    assert!(!body.contains("Full License Usage Table"));

    let (status, json) = common::get_json(&ctx.app, "/api/report").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(json["error"].as_str().unwrap().starts_with("Failed to connect to database"));
}

#[tokio::test]
async fn upload_with_unreachable_database_does_not_append() {
    let mut store = MemoryStore::default();
    store.fail_reads = true;
    let ctx = build_test_context(store);
    let csv = format!("{HEADER}\nVNI-1,5,alpha,adas,val,u1,2,48");

    let (status, body) = common::post_upload(&ctx.app, &csv, None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.contains("Failed to connect to database"));
    assert_eq!(ctx.store.len(), 0);
}

#[tokio::test]
async fn health_reports_database_state() {
    let ctx = build_test_context(MemoryStore::default());
    let (status, json) = common::get_json(&ctx.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], "ok");

    let mut down = MemoryStore::default();
    down.fail_reads = true;
    let ctx = build_test_context(down);
    let (_, json) = common::get_json(&ctx.app, "/health").await;
    assert_eq!(json["database"], "unreachable");
}
