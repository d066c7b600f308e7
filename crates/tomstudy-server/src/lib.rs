//! tomstudy HTTP server — axum adapter on top of `tomstudy-core`.
//!
//! Owns authentication, request validation, and translating core
//! results/errors into responses. All study logic lives in the core.

pub mod api;
pub mod auth;
pub mod format;
pub mod state;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use tomstudy_core::design::DesignConfig;
use tomstudy_core::llm::{ModelConfig, OpenAiChatModel};
use tomstudy_core::{AppState, AppStateInner, Database};

use self::state::ApiState;

/// Configuration for the tomstudy backend server.
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    pub design_path: String,
    pub jwt_secret: String,
    pub model: ModelConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3210,
            db_path: "tomstudy.db".to_string(),
            design_path: "study/design.json".to_string(),
            jwt_secret: String::new(),
            model: ModelConfig::default(),
        }
    }
}

/// Create a shared `AppState` from the server configuration.
pub fn create_app_state(config: &ServerConfig) -> Result<AppState, String> {
    let db = Database::open(&config.db_path).map_err(|e| format!("Failed to open database: {}", e))?;

    let design = DesignConfig::load(Path::new(&config.design_path))
        .map_err(|e| format!("Failed to load design: {}", e))?;

    let model = Arc::new(OpenAiChatModel::new(config.model.clone()));

    Ok(Arc::new(AppStateInner::new(db, design, model)))
}

/// Start the backend server.
///
/// Returns the actual address the server is listening on; the server
/// itself runs in a background task.
pub async fn start_server(config: ServerConfig) -> Result<SocketAddr, String> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tomstudy_server=info,tower_http=info".into()),
        )
        .init();

    tracing::info!(
        "Starting tomstudy backend server on {}:{}",
        config.host,
        config.port
    );

    if config.jwt_secret.is_empty() {
        return Err("JWT secret is empty; set --jwt-secret or API_JWT_KEY".to_string());
    }

    let core = create_app_state(&config)?;
    start_server_with_state(config, core).await
}

/// Start the HTTP server with a pre-built core `AppState`.
pub async fn start_server_with_state(
    config: ServerConfig,
    core: AppState,
) -> Result<SocketAddr, String> {
    let state = ApiState {
        core,
        jwt_secret: Arc::from(config.jwt_secret.as_str()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(api::api_router())
        .route("/api/health", axum::routing::get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    let local_addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get local address: {}", e))?;

    tracing::info!("tomstudy backend server listening on {}", local_addr);

    // Spawn the server in a background task
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok(local_addr)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "server": "tomstudy-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
