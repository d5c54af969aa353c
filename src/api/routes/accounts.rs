//! Login and administrator self-registration.

use crate::api::error::ApiResult;
use crate::roster::StaffMember;
use crate::state::StateHandle;
use axum::{extract::State, response::Json, routing::post, Router};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub display_name: String,
}

pub fn router(state: StateHandle) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .with_state(state)
}

/// POST /login - Check credentials and return the account with its role.
async fn login(
    State(state): State<StateHandle>,
    Json(body): Json<LoginBody>,
) -> ApiResult<Json<StaffMember>> {
    Ok(Json(state.login(&body.username, &body.password).await?))
}

/// POST /register - Create an administrator account.
async fn register(
    State(state): State<StateHandle>,
    Json(body): Json<RegisterBody>,
) -> ApiResult<Json<StaffMember>> {
    let member = state
        .register_admin(&body.username, &body.password, &body.display_name)
        .await?;
    Ok(Json(member))
}
