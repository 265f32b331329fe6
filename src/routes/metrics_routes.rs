//! Metrics exposition endpoint.

use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use tracing::error;

/// Creates the metrics route, mounted at `path`.
pub fn routes(path: &str) -> Router<AppState> {
    Router::new().route(path, get(metrics_handler))
}

/// Handler for the scrape endpoint.
///
/// Returns all collected metrics in Prometheus text format.
async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, HTTPError> {
    let metrics_text = state.metrics.render().map_err(|e| {
        error!(error = %e, "failed to encode metrics");
        HTTPError::new(StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics")
    })?;

    Ok((
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4; charset=utf-8")],
        metrics_text,
    ))
}
