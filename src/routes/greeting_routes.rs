//! Greeting endpoint.

use axum::{routing::get, Router};
use chrono::{DateTime, Utc};

use crate::state::AppState;

const GREETING: &str = "Hello OpenTelemetry! ticks:";

/// Registers the greeting route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(greet))
}

async fn greet() -> String {
    format!("{GREETING}{}", tick_suffix(Utc::now()))
}

/// Last three digits of `now` counted in 100 ns ticks, zero-padded.
///
/// Whole seconds are a multiple of 10^7 ticks, so only the sub-second part
/// can affect the last three digits.
fn tick_suffix(now: DateTime<Utc>) -> String {
    format!("{:03}", (now.timestamp_subsec_nanos() / 100) % 1000)
}
