//! Trade import API handlers
//!
//! POST /api/tradeimport/create-database starts a background import and
//! returns 202 with the job id; the remaining routes are read-only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{validate_year, ImportProgress, ImportRequest, TradeflowType, YearStatistics};
use crate::services::file_locator::is_valid_country_code;
use crate::services::ValidationReport;
use crate::AppState;

/// POST /api/tradeimport/create-database response
#[derive(Debug, Serialize)]
pub struct StartImportResponse {
    pub message: String,
    pub job_id: Uuid,
    pub year: i16,
    pub clear_existing_data: bool,
}

/// GET /api/tradeimport/status response
#[derive(Debug, Serialize)]
pub struct ImportStatusResponse {
    #[serde(flatten)]
    pub progress: ImportProgress,
    pub elapsed_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct ConnectionResponse {
    pub connected: bool,
}

#[derive(Debug, Serialize)]
pub struct CountriesResponse {
    pub year: i16,
    pub countries: Vec<String>,
}

/// POST /api/tradeimport/create-database
///
/// Validates the request, registers the job and returns 202 Accepted at once.
///
/// - 400 Bad Request: year out of range or a malformed country code
/// - 409 Conflict: a job for the same year is still `Pending` or `Running`;
///   the body names the active job id
pub async fn start_import(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> ApiResult<(StatusCode, Json<StartImportResponse>)> {
    request.validate()?;

    let year = request.year;
    let clear_existing_data = request.clear_existing_data;
    let job_id = state.runner.submit(request).await?;

    tracing::info!(job_id = %job_id, year, clear_existing_data, "Import job accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(StartImportResponse {
            message: "Import started".to_string(),
            job_id,
            year,
            clear_existing_data,
        }),
    ))
}

/// GET /api/tradeimport/status/{job_id}
pub async fn get_import_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> ApiResult<Json<ImportStatusResponse>> {
    let progress = state
        .jobs
        .get(job_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Import job not found: {}", job_id)))?;

    tracing::debug!(job_id = %job_id, status = ?progress.status, "Status query");

    Ok(Json(ImportStatusResponse {
        elapsed_seconds: progress.elapsed_seconds(),
        progress,
    }))
}

/// GET /api/tradeimport/statistics/{year}
pub async fn get_statistics(
    State(state): State<AppState>,
    Path(year): Path<i16>,
) -> ApiResult<Json<YearStatistics>> {
    let statistics = state.statistics.year_statistics(year).await?;
    Ok(Json(statistics))
}

/// GET /api/tradeimport/test-connection
pub async fn test_connection(State(state): State<AppState>) -> Json<ConnectionResponse> {
    Json(ConnectionResponse {
        connected: state.statistics.test_connection().await,
    })
}

/// GET /api/tradeimport/countries/{year}
pub async fn get_countries(
    State(state): State<AppState>,
    Path(year): Path<i16>,
) -> ApiResult<Json<CountriesResponse>> {
    validate_year(year)?;
    let locator = state.locator.clone();
    let countries = tokio::task::spawn_blocking(move || locator.available_countries(year))
        .await
        .map_err(|e| ApiError::Internal(format!("Country discovery failed: {}", e)))?;

    Ok(Json(CountriesResponse { year, countries }))
}

/// GET /api/tradeimport/validate/{year}/{country}/{tradeflow}
pub async fn validate_csv_files(
    State(state): State<AppState>,
    Path((year, country, tradeflow)): Path<(i16, String, String)>,
) -> ApiResult<Json<ValidationReport>> {
    validate_year(year)?;
    if !is_valid_country_code(&country) {
        return Err(ApiError::BadRequest(format!("Invalid country code: {}", country)));
    }
    let tradeflow: TradeflowType = tradeflow.parse().map_err(ApiError::BadRequest)?;

    let locator = state.locator.clone();
    let report = tokio::task::spawn_blocking(move || locator.validate(year, &country, tradeflow))
        .await
        .map_err(|e| ApiError::Internal(format!("Validation failed: {}", e)))?;

    Ok(Json(report))
}

/// Build trade import routes
pub fn trade_import_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tradeimport/create-database", post(start_import))
        .route("/api/tradeimport/status/:job_id", get(get_import_status))
        .route("/api/tradeimport/statistics/:year", get(get_statistics))
        .route("/api/tradeimport/test-connection", get(test_connection))
        .route("/api/tradeimport/countries/:year", get(get_countries))
        .route(
            "/api/tradeimport/validate/:year/:country/:tradeflow",
            get(validate_csv_files),
        )
        .route("/api/tradeimport/events", get(super::import_event_stream))
}
