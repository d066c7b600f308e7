//! HTTP-layer state: the core `AppState` plus server-only settings.

use std::sync::Arc;

use tomstudy_core::AppState;

#[derive(Clone)]
pub struct ApiState {
    pub core: AppState,
    pub jwt_secret: Arc<str>,
}
