//! Integration tests for the trade-import HTTP API

mod helpers;

use axum::http::StatusCode;
use helpers::*;
use serde_json::json;

#[tokio::test]
async fn test_health_endpoint() {
    let dir = standard_tree();
    let (app, _pool, _state) = create_test_app(dir.path()).await;

    let (status, body) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "trade-import");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_start_import_rejects_out_of_range_years() {
    let dir = standard_tree();
    let (app, _pool, state) = create_test_app(dir.path()).await;

    for year in [1990, 2018, 2031, 2050] {
        let (status, body) = post_json(
            &app,
            "/api/tradeimport/create-database",
            json!({ "year": year }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "year {}", year);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
        assert_eq!(
            body["error"]["message"],
            "Invalid year. Must be between 2019 and 2030."
        );
    }

    // Rejected before any job was created
    assert!(state.jobs.is_empty().await);
}

#[tokio::test]
async fn test_start_import_rejects_malformed_country_codes() {
    let dir = standard_tree();
    let (app, _pool, state) = create_test_app(dir.path()).await;

    for country in ["../2021/US", "../../../etc", "USA", "U/"] {
        let (status, body) = post_json(
            &app,
            "/api/tradeimport/create-database",
            json!({ "year": 2022, "countries": ["US", country] }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "country {}", country);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
        assert_eq!(
            body["error"]["message"],
            format!("Invalid country code: {}", country)
        );
    }

    assert!(state.jobs.is_empty().await);
}

#[tokio::test]
async fn test_start_import_accepts_valid_year() {
    let dir = standard_tree();
    let (app, _pool, _state) = create_test_app(dir.path()).await;

    let (status, body) = post_json(
        &app,
        "/api/tradeimport/create-database",
        json!({ "year": 2022, "clearExistingData": true }),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["message"], "Import started");
    assert_eq!(body["year"], 2022);
    assert_eq!(body["clear_existing_data"], true);
    assert!(uuid::Uuid::parse_str(body["job_id"].as_str().unwrap()).is_ok());

    wait_for_job(&app, body["job_id"].as_str().unwrap()).await;
}

#[tokio::test]
async fn test_status_unknown_job_is_404() {
    let dir = standard_tree();
    let (app, _pool, _state) = create_test_app(dir.path()).await;

    let (status, body) = get(
        &app,
        &format!("/api/tradeimport/status/{}", uuid::Uuid::new_v4()),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_status_reports_progress_fields() {
    let dir = standard_tree();
    let (app, _pool, _state) = create_test_app(dir.path()).await;

    let job = run_import(&app, json!({ "year": 2022 })).await;

    assert_eq!(job["status"], "Completed");
    assert_eq!(job["year"], 2022);
    assert_eq!(job["records_imported"], 8);
    assert_eq!(job["countries_processed"], 2);
    assert_eq!(job["current_step"], "Import completed. Total records: 8");
    assert!(job["completed_at"].is_string());
    assert!(job["elapsed_seconds"].is_u64());
    assert_eq!(job["failures"], json!([]));
}

#[tokio::test]
async fn test_test_connection() {
    let dir = standard_tree();
    let (app, pool, _state) = create_test_app(dir.path()).await;

    let (status, body) = get(&app, "/api/tradeimport/test-connection").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connected"], true);

    pool.close().await;
    let (_, body) = get(&app, "/api/tradeimport/test-connection").await;
    assert_eq!(body["connected"], false);
}

#[tokio::test]
async fn test_countries_endpoint() {
    let dir = standard_tree();
    std::fs::create_dir_all(dir.path().join("year/2022/USA")).unwrap();
    let (app, _pool, _state) = create_test_app(dir.path()).await;

    let (status, body) = get(&app, "/api/tradeimport/countries/2022").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["countries"], json!(["IN", "US"]));
}

#[tokio::test]
async fn test_validate_endpoint() {
    let dir = standard_tree();
    let (app, _pool, _state) = create_test_app(dir.path()).await;

    let (status, body) = get(&app, "/api/tradeimport/validate/2022/US/imports").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_valid"], true);
    assert_eq!(body["file_count"], 2);
    assert_eq!(body["warnings"], json!(["Expected file not found: trade_factor.csv"]));

    let (_, body) = get(&app, "/api/tradeimport/validate/2022/US/exports").await;
    assert_eq!(body["is_valid"], false);
    assert_eq!(body["error_message"], "No CSV files found for 2022/US/exports");

    let (status, _) = get(&app, "/api/tradeimport/validate/2022/US/sideways").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_validate_rejects_malformed_country() {
    let dir = standard_tree();
    let (app, _pool, _state) = create_test_app(dir.path()).await;

    let (status, body) = get(&app, "/api/tradeimport/validate/2022/USA/imports").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Invalid country code: USA");

    // Percent-encoded separators decode into the path parameter
    let (status, body) = get(&app, "/api/tradeimport/validate/2022/..%2F2021%2FUS/imports").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Invalid country code: ../2021/US");
}

#[tokio::test]
async fn test_statistics_after_import() {
    let dir = standard_tree();
    let (app, _pool, _state) = create_test_app(dir.path()).await;
    run_import(&app, json!({ "year": 2022 })).await;

    let (status, body) = get(&app, "/api/tradeimport/statistics/2022").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["year"], 2022);

    let stats = body["statistics"].as_array().unwrap();
    assert_eq!(stats.len(), 2);
    let us = stats.iter().find(|s| s["region1"] == "US").unwrap();
    assert_eq!(us["tradeflow_type"], "imports");
    assert_eq!(us["trade_count"], 3);
    assert_eq!(us["employment_count"], 2);
    // 100.50 + 200.50 + 300.50
    assert_eq!(us["total_amount"], "601.50");

    let trade = body["table_counts"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["table_name"] == "trade")
        .unwrap()
        .clone();
    assert_eq!(trade["row_count"], 6);

    assert_eq!(
        body["countries"],
        json!([
            { "country_code": "IN", "tradeflow_count": 1, "total_trade_records": 3 },
            { "country_code": "US", "tradeflow_count": 1, "total_trade_records": 3 },
        ])
    );
}
