//! Test helper utilities shared by the trade-import integration tests

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt;
use trade_common::events::EventBus;
use trade_import::config::ImportSettings;
use trade_import::db::SqliteTradeStore;
use trade_import::services::FileLocator;
use trade_import::AppState;

pub const HEADER: &str = "region1,region2,industry1,industry2,amount";

/// CSV content with `rows` data lines for `country`
pub fn csv_rows(country: &str, rows: usize) -> String {
    let mut content = String::from(HEADER);
    for i in 0..rows {
        content.push_str(&format!("\n{},CN,IND{},IND{},{}.50", country, i, i + 1, (i + 1) * 100));
    }
    content
}

/// Write one CSV under `root/year/<year>/<country>/<tradeflow>/<file>`
pub fn write_csv(root: &Path, year: i16, country: &str, tradeflow: &str, file: &str, content: &str) {
    let folder = root
        .join("year")
        .join(year.to_string())
        .join(country)
        .join(tradeflow);
    std::fs::create_dir_all(&folder).expect("Failed to create CSV folder");
    std::fs::write(folder.join(file), content).expect("Failed to write CSV file");
}

/// US imports: trade.csv (3 rows) + trade_employment.csv (2 rows);
/// IN imports: trade.csv (3 rows)
pub fn standard_tree() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    write_csv(dir.path(), 2022, "US", "imports", "trade.csv", &csv_rows("US", 3));
    write_csv(dir.path(), 2022, "US", "imports", "trade_employment.csv", &csv_rows("US", 2));
    write_csv(dir.path(), 2022, "IN", "imports", "trade.csv", &csv_rows("IN", 3));
    dir
}

/// In-memory pool with the trade tables created
pub async fn create_test_db() -> SqlitePool {
    trade_import::db::init_database_pool("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database")
}

/// Router and pool over `root`, with small batches to exercise batching
pub async fn create_test_app(root: &Path) -> (Router, SqlitePool, AppState) {
    let pool = create_test_db().await;
    let settings = ImportSettings {
        batch_size: 2,
        ..ImportSettings::default()
    };
    let state = AppState::new(
        Arc::new(SqliteTradeStore::new(pool.clone())),
        FileLocator::new(root).expect("Failed to create locator"),
        EventBus::new(100),
        settings,
    );
    (trade_import::build_router(state.clone()), pool, state)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    split(response).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    split(response).await
}

async fn split(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Poll the status endpoint until the job is terminal
pub async fn wait_for_job(app: &Router, job_id: &str) -> Value {
    for _ in 0..300 {
        let (status, body) = get(app, &format!("/api/tradeimport/status/{}", job_id)).await;
        assert_eq!(status, StatusCode::OK);
        if body["status"] == "Completed" || body["status"] == "Failed" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("Import job {} did not finish", job_id);
}

/// Start an import through the API and wait for it to finish
pub async fn run_import(app: &Router, body: Value) -> Value {
    let (status, started) = post_json(app, "/api/tradeimport/create-database", body).await;
    assert_eq!(status, StatusCode::ACCEPTED, "{}", started);
    let job_id = started["job_id"].as_str().unwrap().to_string();
    wait_for_job(app, &job_id).await
}

pub async fn count_rows(pool: &SqlitePool, table: &str, year: i16) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {} WHERE year = ?", table))
        .bind(year)
        .fetch_one(pool)
        .await
        .unwrap()
}
