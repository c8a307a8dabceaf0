//! End-to-end import runs against an in-memory store and a temp CSV tree

mod helpers;

use helpers::*;
use serde_json::json;

#[tokio::test]
async fn test_two_country_import_totals_eight_records() {
    let dir = standard_tree();
    let (app, pool, _state) = create_test_app(dir.path()).await;

    let job = run_import(&app, json!({ "year": 2022 })).await;

    assert_eq!(job["status"], "Completed");
    assert_eq!(job["records_imported"], 8);
    assert_eq!(job["countries_processed"], 2);
    assert_eq!(job["files_processed"], 3);
    assert_eq!(job["files_failed"], 0);

    assert_eq!(count_rows(&pool, "trade", 2022).await, 6);
    assert_eq!(count_rows(&pool, "trade_employment", 2022).await, 2);

    let lineage: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT source_file FROM trade ORDER BY source_file",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(
        lineage,
        vec!["2022/IN/imports/trade.csv", "2022/US/imports/trade.csv"]
    );

    let values: Vec<String> = sqlx::query_scalar(
        "SELECT employment_value FROM trade_employment ORDER BY trade_id",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(values, vec!["100.50", "200.50"]);
}

#[tokio::test]
async fn test_rerun_without_clear_duplicates_rows() {
    let dir = standard_tree();
    let (app, pool, _state) = create_test_app(dir.path()).await;

    run_import(&app, json!({ "year": 2022 })).await;
    let second = run_import(&app, json!({ "year": 2022, "clear_existing_data": false })).await;

    assert_eq!(second["records_imported"], 8);
    assert_eq!(count_rows(&pool, "trade", 2022).await, 12);
}

#[tokio::test]
async fn test_rerun_with_clear_replaces_rows() {
    let dir = standard_tree();
    let (app, pool, _state) = create_test_app(dir.path()).await;

    // A row from another year must survive the clear
    sqlx::query(
        "INSERT INTO trade (year, region1, region2, industry1, industry2, amount, tradeflow_type, source_file) \
         VALUES (2021, 'US', 'CN', 'A', 'B', '1', 'imports', 'manual')",
    )
    .execute(&pool)
    .await
    .unwrap();

    run_import(&app, json!({ "year": 2022 })).await;
    let second = run_import(&app, json!({ "year": 2022, "clear_existing_data": true })).await;

    assert_eq!(second["status"], "Completed");
    assert_eq!(count_rows(&pool, "trade", 2022).await, 6);
    assert_eq!(count_rows(&pool, "trade_employment", 2022).await, 2);
    assert_eq!(count_rows(&pool, "trade", 2021).await, 1);
}

#[tokio::test]
async fn test_failed_file_does_not_stop_the_run() {
    let dir = standard_tree();
    write_csv(
        dir.path(),
        2022,
        "US",
        "exports",
        "trade_factor.csv",
        &format!("{}\nUS,CN,A,B,12.5\nUS,CN,A,B,twelve", HEADER),
    );
    write_csv(dir.path(), 2022, "US", "domestic", "summary.csv", &csv_rows("US", 2));
    write_csv(dir.path(), 2022, "US", "domestic", "runnote.csv", "not data");

    let (app, pool, _state) = create_test_app(dir.path()).await;
    let job = run_import(&app, json!({ "year": 2022 })).await;

    assert_eq!(job["status"], "Completed");
    assert_eq!(job["records_imported"], 8);
    assert_eq!(job["files_failed"], 2);

    let failures = job["failures"].as_array().unwrap();
    assert_eq!(failures[0]["source_file"], "2022/US/exports/trade_factor.csv");
    assert_eq!(failures[0]["table"], "trade_factor");
    assert_eq!(failures[1]["source_file"], "2022/US/domestic/summary.csv");
    assert_eq!(failures[1]["error"], "Unknown CSV file type: summary.csv");

    assert_eq!(count_rows(&pool, "trade_factor", 2022).await, 0);
}

#[tokio::test]
async fn test_country_filter_and_missing_year() {
    let dir = standard_tree();
    let (app, pool, _state) = create_test_app(dir.path()).await;

    let job = run_import(&app, json!({ "year": 2022, "countries": ["IN"] })).await;
    assert_eq!(job["records_imported"], 3);
    assert_eq!(count_rows(&pool, "trade_employment", 2022).await, 0);

    let job = run_import(&app, json!({ "year": 2023 })).await;
    assert_eq!(job["status"], "Failed");
    assert_eq!(job["error_message"], "No countries found for year 2023");
}

#[tokio::test]
async fn test_bea_alias_and_case_insensitive_names() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(dir.path(), 2022, "US", "imports", "TRADE.CSV", &csv_rows("US", 1));
    write_csv(dir.path(), 2022, "US", "imports", "bea2.csv", &csv_rows("US", 2));

    let (app, pool, _state) = create_test_app(dir.path()).await;
    let job = run_import(&app, json!({ "year": 2022 })).await;

    assert_eq!(job["records_imported"], 3);
    assert_eq!(count_rows(&pool, "trade", 2022).await, 1);
    assert_eq!(count_rows(&pool, "bea_table2", 2022).await, 2);
}
