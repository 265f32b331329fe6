//! Per-request metric tags.
//!
//! The request-duration layer inserts a [`MetricsTagsFeature`] into each
//! request's extensions; inner middleware may add tags to it and the layer
//! reads them back once the response is produced. Requests without the
//! extension simply have no way to carry tags.

use std::sync::{Arc, Mutex};

/// Tag key carrying the classified `utm_medium` query parameter.
pub const MEDIUM_TAG: &str = "mkt_medium";

/// Shared, append-only set of tags attached to one request's duration sample.
#[derive(Clone, Default, Debug)]
pub struct MetricsTagsFeature {
    tags: Arc<Mutex<Vec<(String, String)>>>,
}

impl MetricsTagsFeature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tag. A poisoned lock drops the tag instead of failing the request.
    pub fn add(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut tags) = self.tags.lock() {
            tags.push((key.into(), value.into()));
        }
    }

    /// Returns the most recently added value for `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        let tags = self.tags.lock().ok()?;
        tags.iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }
}
