//! Metrics collection and exposition for Prometheus.
//!
//! This module provides centralized metrics recording: the custom
//! `MyApp.Custom` request counter plus the HTTP server request and
//! connection instruments, all owned by one registry per process.

mod cardinality;
mod connections;
mod recorder;
mod tags;

pub use cardinality::{DEFAULT_MAX_ENDPOINT_SERIES, OVERFLOW_LABEL};
pub use connections::ConnectionTracker;
pub use recorder::{
    Metrics, MetricsRecorder, CUSTOM_METER_NAME, CUSTOM_METER_VERSION, REQUEST_COUNT_INSTRUMENT,
    REQUEST_DURATION_BUCKETS,
};
pub use tags::{MetricsTagsFeature, MEDIUM_TAG};
