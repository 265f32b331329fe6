//! Request pipeline middleware.
//!
//! `request_duration` wraps the whole router and plays the part of the
//! server's built-in instrumentation; `tagging` runs inside it and feeds
//! the custom counter and the `mkt_medium` tag.

pub mod medium;
pub mod request_duration;
pub mod tagging;

pub use medium::{classify_medium, MarketingMedium, UTM_MEDIUM_PARAM};
pub use request_duration::record_request_duration;
pub use tagging::{apply_request_tags, tag_request};
