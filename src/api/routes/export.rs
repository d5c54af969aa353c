//! CSV downloads.

use crate::api::error::ApiResult;
use crate::report;
use crate::state::StateHandle;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Local;

pub fn router(state: StateHandle) -> Router {
    Router::new()
        .route("/detailed.csv", get(detailed))
        .route("/summary.csv", get(summary))
        .with_state(state)
}

fn csv_download(prefix: &str, body: String) -> Response {
    let filename = report::export_filename(prefix, Local::now().date_naive());
    (
        [
            (header::CONTENT_TYPE, "text/csv;charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

/// GET /export/detailed.csv
async fn detailed(State(state): State<StateHandle>) -> ApiResult<Response> {
    let snapshot = state.snapshot().await;
    let body = report::detailed_csv(&snapshot.events, &Local)?;
    Ok(csv_download("detailed_attendance_logs", body))
}

/// GET /export/summary.csv
async fn summary(State(state): State<StateHandle>) -> ApiResult<Response> {
    let snapshot = state.snapshot().await;
    let rows = report::aggregate(&snapshot.events, &snapshot.directory.staff(), &Local::now());
    let body = report::summary_csv(&rows)?;
    Ok(csv_download("monthly_attendance_summary", body))
}
