//! HTTP route definitions and handlers.
//!
//! Groups the greeting, scrape and health endpoints and wraps them in the
//! instrumentation middleware.

mod greeting_routes;
mod health_routes;
mod metrics_routes;

use crate::middleware::{record_request_duration, tag_request};
use crate::state::AppState;
use axum::{middleware::from_fn_with_state, Router};

/// Creates the application router with all configured routes.
///
/// Every route passes through the request-duration layer (outermost) and
/// then the tagging middleware before reaching its handler.
pub fn create_router(state: AppState) -> Router {
    let metrics_path = state.config.metrics.path.clone();

    Router::new()
        .merge(greeting_routes::routes())
        .merge(metrics_routes::routes(&metrics_path))
        .merge(health_routes::routes())
        .layer(from_fn_with_state(state.clone(), tag_request))
        .layer(from_fn_with_state(state.clone(), record_request_duration))
        .with_state(state)
}
