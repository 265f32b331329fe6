//! Liveness endpoint.

use crate::state::AppState;
use axum::{routing::get, Router};

/// Registers the health route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(|| async { "OK" }))
}
