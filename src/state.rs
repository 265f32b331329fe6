//! Shared application state.
//!
//! Contains the state that is shared across all request handlers and
//! middleware: the configuration and the metrics registry.

use crate::config::ConfigV1;
use crate::metrics::Metrics;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// This state is cloned for each request handler; clones share the same
/// configuration and the same metrics registry.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// Process-wide metrics registry.
    pub metrics: Metrics,
}
