//! tomstudy Core — Transport-agnostic domain logic for the study platform.
//!
//! This crate contains the business logic of a web-based research study:
//! the step catalog and progress tracking, the per-task conversation log,
//! and the agent pipeline that answers participant questions about a code
//! snippet. It has **no HTTP framework dependency** by default, making it
//! suitable for use in:
//!
//! - HTTP servers (via `tomstudy-server`)
//! - CLI tools (seeding, data export)
//!
//! # Feature Flags
//!
//! - `axum` — Enables `IntoResponse` impl on `StudyError` for use in axum handlers.

pub mod agent;
pub mod db;
pub mod design;
pub mod error;
pub mod llm;
pub mod models;
pub mod orchestration;
pub mod state;
pub mod steps;
pub mod store;

// Convenience re-exports
pub use db::Database;
pub use error::StudyError;
pub use state::{AppState, AppStateInner};
