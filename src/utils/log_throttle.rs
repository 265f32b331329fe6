use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct WindowState {
    window_started_at: Instant,
    suppressed: u64,
}

/// Rate limiter for repetitive log lines, keyed by an arbitrary string
/// (e.g. an error kind). One line per key is let through per interval.
#[derive(Debug)]
pub struct LogThrottle {
    interval: Duration,
    windows: Mutex<HashMap<String, WindowState>>,
}

impl LogThrottle {
    pub fn new(interval: Duration) -> Self {
        LogThrottle {
            interval,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `Some(suppressed_count)` when a log for `key` should be emitted,
    /// otherwise `None` and the event is counted as suppressed for the active window.
    ///
    /// A poisoned lock lets every line through.
    pub fn should_emit(&self, key: &str) -> Option<u64> {
        let Ok(mut map) = self.windows.lock() else {
            return Some(0);
        };
        let now = Instant::now();

        match map.get_mut(key) {
            Some(state) if now.duration_since(state.window_started_at) >= self.interval => {
                let suppressed = state.suppressed;
                state.window_started_at = now;
                state.suppressed = 0;
                Some(suppressed)
            }
            Some(state) => {
                state.suppressed += 1;
                None
            }
            None => {
                map.insert(
                    key.to_string(),
                    WindowState {
                        window_started_at: now,
                        suppressed: 0,
                    },
                );
                Some(0)
            }
        }
    }
}
