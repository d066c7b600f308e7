use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use tomstudy_core::StudyError;

use crate::auth::{issue_token, CurrentUser};
use crate::format::{user_response, UserResponse};
use crate::state::ApiState;

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", get(refresh))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, serde::Serialize)]
struct SessionResponse {
    user: UserResponse,
    token: String,
}

async fn login(
    State(state): State<ApiState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, StudyError> {
    let user = state
        .core
        .user_store
        .get_by_username(&body.username)
        .await?
        .filter(|user| user.password == body.password)
        .ok_or_else(|| StudyError::Unauthorized("auth/invalid-credentials".to_string()))?;

    let token = issue_token(&user, &state.jwt_secret)?;
    Ok(Json(SessionResponse {
        user: user_response(&user),
        token,
    }))
}

async fn refresh(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<SessionResponse>, StudyError> {
    let token = issue_token(&user, &state.jwt_secret)?;
    Ok(Json(SessionResponse {
        user: user_response(&user),
        token,
    }))
}
