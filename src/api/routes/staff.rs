//! Staff management endpoints.

use crate::api::error::ApiResult;
use crate::roster::StaffMember;
use crate::state::StateHandle;
use axum::{extract::State, response::Json, routing::get, Router};
use serde::Deserialize;
use tracing::info;

/// A new staff account, authorised by an administrator's credentials.
#[derive(Debug, Deserialize)]
pub struct NewStaffBody {
    #[serde(default)]
    pub admin_username: String,
    #[serde(default)]
    pub admin_password: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub display_name: String,
}

pub fn router(state: StateHandle) -> Router {
    Router::new()
        .route("/", get(list_staff).post(add_staff))
        .with_state(state)
}

/// GET /staff - Staff-role members in registration order.
async fn list_staff(State(state): State<StateHandle>) -> Json<Vec<StaffMember>> {
    Json(state.snapshot().await.directory.staff())
}

/// POST /staff - Register a staff member. Admin only.
async fn add_staff(
    State(state): State<StateHandle>,
    Json(body): Json<NewStaffBody>,
) -> ApiResult<Json<StaffMember>> {
    let member = state
        .add_staff(
            &body.admin_username,
            &body.admin_password,
            &body.username,
            &body.password,
            &body.display_name,
        )
        .await?;
    info!(
        "{} added staff member {} ({})",
        body.admin_username, member.display_name, member.username
    );
    Ok(Json(member))
}
