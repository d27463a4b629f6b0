//! # Report Routes
//!
//! Thin views: bind query parameters, call the report service, map the
//! uniform error object to an HTTP status. No business logic lives here.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use tally_client::ReportService;
use tally_core::{ErrorResponse, SalesReport};

type AppState = Arc<ReportService>;

/// Builds the back-office router.
pub fn router(service: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/reports/sales/daily", get(daily_sales))
        .route("/reports/sales/weekly", get(weekly_sales))
        .route("/reports/sales/monthly", get(monthly_sales))
        .with_state(service)
}

// =============================================================================
// Query Parameters
// =============================================================================

#[derive(Debug, Deserialize)]
struct DailyQuery {
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WeeklyQuery {
    start_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MonthlyQuery {
    year: Option<i32>,
    month: Option<u32>,
}

// =============================================================================
// Handlers
// =============================================================================

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn daily_sales(
    State(service): State<AppState>,
    Query(query): Query<DailyQuery>,
) -> Response {
    into_response(service.daily_report(query.date).await)
}

async fn weekly_sales(
    State(service): State<AppState>,
    Query(query): Query<WeeklyQuery>,
) -> Response {
    into_response(service.weekly_report(query.start_date).await)
}

async fn monthly_sales(
    State(service): State<AppState>,
    Query(query): Query<MonthlyQuery>,
) -> Response {
    into_response(service.monthly_report(query.year, query.month).await)
}

// =============================================================================
// Response Mapping
// =============================================================================

fn into_response(result: Result<SalesReport, ErrorResponse>) -> Response {
    match result {
        Ok(report) => Json(report).into_response(),
        Err(err) => (error_status(&err), Json(err)).into_response(),
    }
}

/// Maps the error object's status_code to a transport status, falling
/// back to 500 on anything out of range.
fn error_status(err: &ErrorResponse) -> StatusCode {
    StatusCode::from_u16(err.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

// =============================================================================
// Unit Tests
// =============================================================================
