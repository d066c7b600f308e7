pub mod auth;
pub mod step;

use axum::Router;

use crate::state::ApiState;

/// Build the complete API router with all sub-routes.
pub fn api_router() -> Router<ApiState> {
    Router::new()
        .nest("/api/auth", auth::router())
        .nest("/api/step", step::router())
}
