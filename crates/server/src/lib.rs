// crates/server/src/lib.rs
//! Cogtrain server library.
//!
//! Axum HTTP service over the aggregation pipeline: authenticated session
//! writes, on-demand domain summary computation, summary reads and generic
//! per-user record CRUD.

pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;

pub use auth::{AuthUser, Authenticator};
pub use config::Config;
pub use error::*;
pub use metrics::{init_metrics, render_metrics};
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use cogtrain_db::Database;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the Axum application backed by `db`.
pub fn create_app(db: Database, auth: Authenticator) -> Router {
    create_app_with_state(AppState::new(db, auth))
}

/// Create the Axum application over prepared state.
///
/// This sets up:
/// - API routes and `/metrics`
/// - CORS (allows any origin)
/// - Request tracing
pub fn create_app_with_state(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Integration Tests
// ============================================================================
