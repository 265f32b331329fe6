//! Server-level request instrumentation.

use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::metrics::{MetricsRecorder, MetricsTagsFeature, MEDIUM_TAG};
use crate::state::AppState;

/// Decrements the in-flight gauge even if the request future is dropped.
struct InFlight<'a, M: MetricsRecorder> {
    metrics: &'a M,
}

impl<'a, M: MetricsRecorder> InFlight<'a, M> {
    fn start(metrics: &'a M) -> Self {
        metrics.request_started();
        InFlight { metrics }
    }
}

impl<M: MetricsRecorder> Drop for InFlight<'_, M> {
    fn drop(&mut self) {
        self.metrics.request_finished();
    }
}

/// Times every request and records it in `http_server_request_duration_seconds`.
///
/// When request tagging is enabled a fresh [`MetricsTagsFeature`] is offered
/// to inner middleware; its `mkt_medium` tag becomes a label of the sample.
pub async fn record_request_duration(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let tags = state.config.metrics.request_tags.then(|| {
        let tags = MetricsTagsFeature::new();
        request.extensions_mut().insert(tags.clone());
        tags
    });

    let method = request.method().as_str().to_owned();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_default();

    let start = Instant::now();
    let response = {
        let _in_flight = InFlight::start(&state.metrics);
        next.run(request).await
    };
    let elapsed = start.elapsed().as_secs_f64();

    let medium = tags.and_then(|tags| tags.get(MEDIUM_TAG));
    state.metrics.record_request_duration(
        &method,
        &route,
        response.status().as_u16(),
        medium.as_deref(),
        elapsed,
    );

    response
}
