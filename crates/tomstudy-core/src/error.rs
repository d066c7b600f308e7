//! Core error type for the tomstudy platform.
//!
//! `StudyError` is used throughout the core domain (stores, agent
//! pipeline, orchestration). When the `axum` feature is enabled, it also
//! implements `IntoResponse` so it can be used directly as an axum
//! handler error type.

#[derive(Debug, thiserror::Error)]
pub enum StudyError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid design config: {0}")]
    Config(String),

    #[error("step/invalid-task: {0}")]
    InvalidTask(String),

    #[error("step/not-current")]
    StepNotCurrent,

    #[error("Agent invocation failed: {0}")]
    AgentFailed(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// axum integration (opt-in via feature flag)
// ---------------------------------------------------------------------------

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for StudyError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let (status, message) = match &self {
            StudyError::Database(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            StudyError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            StudyError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            StudyError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            StudyError::InvalidTask(_) => (StatusCode::NOT_FOUND, "step/invalid-task".to_string()),
            StudyError::StepNotCurrent => (StatusCode::FORBIDDEN, "step/not-current".to_string()),
            // The participant's input is not saved on agent failure, so the
            // client is expected to resend it.
            StudyError::AgentFailed(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            StudyError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            StudyError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}
