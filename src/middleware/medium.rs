use std::fmt;

/// Query parameter holding the marketing medium of a visit.
pub const UTM_MEDIUM_PARAM: &str = "utm_medium";

/// Marketing channel a request was attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketingMedium {
    /// No `utm_medium`, or an empty one.
    Unspecified,
    Social,
    Email,
    Organic,
    Other,
}

impl MarketingMedium {
    /// Tag value used for the `mkt_medium` label.
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketingMedium::Unspecified => "none",
            MarketingMedium::Social => "social",
            MarketingMedium::Email => "email",
            MarketingMedium::Organic => "organic",
            MarketingMedium::Other => "other",
        }
    }
}

impl fmt::Display for MarketingMedium {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a raw `utm_medium` value onto its category. Matching is exact and
/// case-sensitive.
pub fn classify_medium(utm_medium: &str) -> MarketingMedium {
    match utm_medium {
        "" => MarketingMedium::Unspecified,
        "social" => MarketingMedium::Social,
        "email" => MarketingMedium::Email,
        "organic" => MarketingMedium::Organic,
        _ => MarketingMedium::Other,
    }
}
