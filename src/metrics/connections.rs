//! Connection lifetime tracking for the server loop.

use std::time::Instant;

use super::MetricsRecorder;

/// Marks a connection open on creation and closed (with its lifetime) on drop.
///
/// Held by the per-connection task, so the gauge is corrected even when the
/// task ends through an error path.
pub struct ConnectionTracker<M: MetricsRecorder> {
    metrics: M,
    opened_at: Instant,
}

impl<M: MetricsRecorder> ConnectionTracker<M> {
    pub fn open(metrics: M) -> Self {
        metrics.connection_opened();
        ConnectionTracker {
            metrics,
            opened_at: Instant::now(),
        }
    }
}

impl<M: MetricsRecorder> Drop for ConnectionTracker<M> {
    fn drop(&mut self) {
        self.metrics
            .connection_closed(self.opened_at.elapsed().as_secs_f64());
    }
}
