//! Clock control endpoints.
//!
//! - Clocking in or out (POST /clock)
//! - Capturing without waiting for the countdown (POST /capture)
//! - Cancelling a running capture (POST /cancel)
//! - Capture status (GET /status)

use crate::api::error::{ApiError, ApiResult};
use crate::attendance::{AttendanceEvent, AttendanceKind};
use crate::capture::CaptureStatusHandle;
use crate::clock::ClockRequest;
use crate::location::AccuracyProfile;
use crate::state::StateHandle;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

#[derive(Debug, Clone, Deserialize)]
pub struct ClockBody {
    pub username: String,
    pub password: String,
    pub kind: ClockKind,
    /// Location accuracy profile (default: from config)
    #[serde(default)]
    pub accuracy: Option<AccuracyProfile>,
}

/// `in` / `out`, also accepting the record spelling.
#[derive(Debug, Clone, Copy, Deserialize)]
pub enum ClockKind {
    #[serde(rename = "in", alias = "CLOCK_IN")]
    In,
    #[serde(rename = "out", alias = "CLOCK_OUT")]
    Out,
}

impl From<ClockKind> for AttendanceKind {
    fn from(kind: ClockKind) -> Self {
        match kind {
            ClockKind::In => AttendanceKind::ClockIn,
            ClockKind::Out => AttendanceKind::ClockOut,
        }
    }
}

pub enum ApiCommand {
    Clock {
        request: ClockRequest,
        reply: oneshot::Sender<ClockReply>,
    },
    CaptureNow,
    CancelCapture,
}

#[derive(Debug)]
pub enum ClockReply {
    /// Stored provisional record; enrichment continues in the background.
    Recorded(AttendanceEvent),
    Denied,
    Cancelled,
    Busy,
    Failed(String),
}

#[derive(Clone)]
pub struct ClockState {
    pub tx: mpsc::Sender<ApiCommand>,
    pub status: CaptureStatusHandle,
    pub state: StateHandle,
    pub accuracy: AccuracyProfile,
}

pub fn router(state: ClockState) -> Router {
    Router::new()
        .route("/clock", post(clock))
        .route("/capture", post(capture_now))
        .route("/cancel", post(cancel))
        .route("/status", get(capture_status))
        .with_state(state)
}

/// Authenticates the body's credentials as a staff member and runs a
/// capture. Admin accounts are refused.
///
/// Responds once the still is taken with the provisional record
/// (`pending: true`); greeting and location are filled in afterwards and
/// show up under `GET /records`.
async fn clock(
    State(state): State<ClockState>,
    Json(body): Json<ClockBody>,
) -> ApiResult<Json<Value>> {
    let member = state
        .state
        .clocking_member(&body.username, &body.password)
        .await?;
    let kind = AttendanceKind::from(body.kind);
    info!("Clock command received via API: {} {}", member.username, kind.as_str());

    let (reply_tx, reply_rx) = oneshot::channel();
    let command = ApiCommand::Clock {
        request: ClockRequest {
            member,
            kind,
            accuracy: body.accuracy.unwrap_or(state.accuracy),
        },
        reply: reply_tx,
    };

    if let Err(e) = state.tx.send(command).await {
        error!("Failed to send clock command: {}", e);
        return Err(ApiError::internal("Clock service is not running"));
    }

    let reply = reply_rx
        .await
        .map_err(|_| ApiError::internal("Clock service dropped the request"))?;

    match reply {
        ClockReply::Recorded(record) => Ok(Json(json!({
            "success": true,
            "record": record,
        }))),
        ClockReply::Denied => Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Camera access denied",
        )),
        ClockReply::Cancelled => Ok(Json(json!({
            "success": false,
            "message": "Capture cancelled",
        }))),
        ClockReply::Busy => Err(ApiError::conflict("A capture is already running")),
        ClockReply::Failed(message) => Err(ApiError::internal(message)),
    }
}

/// Takes the still immediately when a countdown is running.
async fn capture_now(State(state): State<ClockState>) -> ApiResult<Json<Value>> {
    send(&state, ApiCommand::CaptureNow).await
}

async fn cancel(State(state): State<ClockState>) -> ApiResult<Json<Value>> {
    send(&state, ApiCommand::CancelCapture).await
}

async fn send(state: &ClockState, command: ApiCommand) -> ApiResult<Json<Value>> {
    state
        .tx
        .send(command)
        .await
        .map_err(|_| ApiError::internal("Clock service is not running"))?;
    Ok(Json(json!({ "success": true })))
}

async fn capture_status(State(state): State<ClockState>) -> Json<Value> {
    let status = state.status.get();
    Json(json!({
        "phase": status.phase.as_str(),
        "countdown": status.countdown,
    }))
}
