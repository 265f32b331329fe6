//! Marketing-medium tagging and the custom request counter.

use std::collections::HashMap;

use axum::extract::{Query, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use percent_encoding::percent_decode_str;
use tracing::debug;

use super::medium::{classify_medium, UTM_MEDIUM_PARAM};
use crate::metrics::{MetricsRecorder, MetricsTagsFeature, MEDIUM_TAG};
use crate::state::AppState;

/// Middleware entry point; see [`apply_request_tags`].
pub async fn tag_request(State(state): State<AppState>, request: Request, next: Next) -> Response {
    apply_request_tags(&state.metrics, &request);
    next.run(request).await
}

/// Classifies `utm_medium`, attaches it as `mkt_medium` when the request
/// carries a [`MetricsTagsFeature`], and counts the request against its path.
///
/// A missing or unparsable query string counts as an empty medium. The
/// endpoint label is the percent-decoded path; invalid UTF-8 is replaced
/// lossily.
pub fn apply_request_tags<M: MetricsRecorder>(metrics: &M, request: &Request) {
    let utm_medium = Query::<HashMap<String, String>>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(mut params)| params.remove(UTM_MEDIUM_PARAM))
        .unwrap_or_default();
    let medium = classify_medium(&utm_medium);

    match request.extensions().get::<MetricsTagsFeature>() {
        Some(tags) => tags.add(MEDIUM_TAG, medium.as_str()),
        None => debug!(medium = %medium, "request tagging unavailable, tag omitted"),
    }

    let path = percent_decode_str(request.uri().path()).decode_utf8_lossy();
    metrics.register_request(&path);
}
