//! Records and dashboard views.

use crate::attendance::AttendanceEvent;
use crate::report::{self, DailyOverview, MonthlySummary};
use crate::state::StateHandle;
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use chrono::Local;
use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct RecordsQueryParams {
    /// Only records for this display name
    pub staff: Option<String>,
    /// Maximum results
    pub limit: Option<usize>,
}

pub fn router(state: StateHandle) -> Router {
    Router::new()
        .route("/records", get(list_records))
        .route("/summary", get(monthly_summary))
        .route("/overview", get(overview))
        .with_state(state)
}

/// GET /records - Attendance records, newest first.
async fn list_records(
    State(state): State<StateHandle>,
    Query(params): Query<RecordsQueryParams>,
) -> Json<Vec<AttendanceEvent>> {
    let snapshot = state.snapshot().await;
    let records: Vec<AttendanceEvent> = match &params.staff {
        Some(name) => report::records_for(&snapshot.events, name)
            .into_iter()
            .cloned()
            .collect(),
        None => snapshot.events,
    };

    let limit = params.limit.unwrap_or(usize::MAX);
    Json(records.into_iter().take(limit).collect())
}

/// GET /summary - Monthly presence per staff member.
async fn monthly_summary(State(state): State<StateHandle>) -> Json<Vec<MonthlySummary>> {
    let snapshot = state.snapshot().await;
    let staff = snapshot.directory.staff();
    Json(report::aggregate(&snapshot.events, &staff, &Local::now()))
}

/// GET /overview - Today's records and active staff.
async fn overview(State(state): State<StateHandle>) -> Json<DailyOverview> {
    let snapshot = state.snapshot().await;
    let total_staff = snapshot.directory.staff().len();
    Json(report::today(&snapshot.events, total_staff, &Local::now()))
}
