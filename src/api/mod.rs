//! Local HTTP API for StaffSnap.
//!
//! Provides HTTP endpoints for:
//! - Login and administrator registration
//! - Clocking in and out (clock, capture, cancel, status)
//! - Records and dashboard views
//! - CSV exports
//! - Staff management

pub mod error;
pub mod routes;

use crate::capture::CaptureStatusHandle;
use crate::config::Config;
use crate::state::StateHandle;
use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tracing::info;

pub use routes::clock::{ApiCommand, ClockReply, ClockState};

pub struct ApiServer {
    port: u16,
    clock_state: ClockState,
    state: StateHandle,
}

impl ApiServer {
    pub fn new(
        tx: mpsc::Sender<ApiCommand>,
        status: CaptureStatusHandle,
        state: StateHandle,
        config: &Config,
    ) -> Self {
        Self {
            port: config.api.port,
            clock_state: ClockState {
                tx,
                status,
                state: state.clone(),
                accuracy: config.location.accuracy,
            },
            state,
        }
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/", get(status))
            .route("/version", get(version))
            .merge(routes::accounts::router(self.state.clone()))
            .merge(routes::clock::router(self.clock_state))
            .merge(routes::records::router(self.state.clone()))
            .nest("/export", routes::export::router(self.state.clone()))
            .nest("/staff", routes::staff::router(self.state))
            .layer(ServiceBuilder::new())
    }

    pub async fn start(self) -> Result<()> {
        let port = self.port;
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(&format!("127.0.0.1:{}", port)).await?;

        info!("API server listening on http://127.0.0.1:{}", port);
        info!("Endpoints:");
        info!("  GET  /                     - Service info");
        info!("  GET  /version              - Get version info");
        info!("  POST /login                - Check credentials");
        info!("  POST /register             - Register an administrator");
        info!("  POST /clock                - Clock in or out");
        info!("  POST /capture              - Capture without waiting");
        info!("  POST /cancel               - Cancel the running capture");
        info!("  GET  /status               - Get capture status");
        info!("  GET  /records              - List attendance records");
        info!("  GET  /summary              - Monthly attendance summary");
        info!("  GET  /overview             - Today's overview");
        info!("  GET  /export/detailed.csv  - Download detailed log");
        info!("  GET  /export/summary.csv   - Download monthly summary");
        info!("  GET  /staff                - List staff");
        info!("  POST /staff                - Add a staff member (admin)");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn status() -> Json<Value> {
    Json(json!({
        "service": "staffsnap",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "staffsnap"
    }))
}
