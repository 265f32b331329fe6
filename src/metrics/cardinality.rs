//! Series cap for unbounded label values.
//!
//! Request paths come straight from clients, so the endpoint label is
//! capped: the first `max_series` distinct values get their own series and
//! every later value is folded into a single overflow series.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use tracing::warn;

use crate::utils::log_throttle::LogThrottle;

/// Default number of distinct `endpoint` values before overflow.
pub const DEFAULT_MAX_ENDPOINT_SERIES: usize = 2000;

/// Label set to `"true"` on the overflow series.
pub const OVERFLOW_LABEL: &str = "otel_metric_overflow";

const OVERFLOW_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Tracks which label values of one metric own a series.
#[derive(Debug)]
pub struct SeriesLimit {
    metric: &'static str,
    max_series: usize,
    seen: Mutex<HashSet<String>>,
    throttle: LogThrottle,
}

impl SeriesLimit {
    pub fn new(metric: &'static str, max_series: usize) -> Self {
        SeriesLimit {
            metric,
            max_series,
            seen: Mutex::new(HashSet::new()),
            throttle: LogThrottle::new(OVERFLOW_LOG_INTERVAL),
        }
    }

    /// Returns true when `value` may be recorded under its own series.
    ///
    /// Values admitted once stay admitted. A poisoned lock sends everything
    /// to the overflow series.
    pub fn admit(&self, value: &str) -> bool {
        let Ok(mut seen) = self.seen.lock() else {
            return false;
        };
        if seen.contains(value) {
            return true;
        }
        if seen.len() < self.max_series {
            seen.insert(value.to_owned());
            return true;
        }
        drop(seen);

        if let Some(suppressed) = self.throttle.should_emit(self.metric) {
            warn!(
                metric = self.metric,
                limit = self.max_series,
                suppressed,
                "Series limit reached, recording into the overflow series"
            );
        }
        false
    }
}
