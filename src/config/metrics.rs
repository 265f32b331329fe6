use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::metrics::DEFAULT_MAX_ENDPOINT_SERIES;

/// Settings for the scrape endpoint and request instrumentation.
///
/// Histogram bucket boundaries live in [`crate::metrics::REQUEST_DURATION_BUCKETS`].
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct MetricsConfig {
    /// Path the Prometheus scrape endpoint is mounted on.
    pub path: String,
    /// When false, requests carry no tagging feature and `mkt_medium` stays empty.
    pub request_tags: bool,
    /// Distinct request paths that get their own counter series before
    /// further paths are folded into the overflow series.
    pub max_endpoint_series: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            path: "/metrics".to_string(),
            request_tags: true,
            max_endpoint_series: DEFAULT_MAX_ENDPOINT_SERIES,
        }
    }
}
