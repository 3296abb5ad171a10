//! Per-run pipeline settings passed into the sync driver at construction.

use serde::{Deserialize, Serialize};

/// Default listing endpoint walked by the sync pipeline.
pub const DEFAULT_LISTING_BASE_URL: &str =
    "https://www.appliancesdelivered.ie/search/small-appliances";

/// What to do with a product card whose detail URL carries no trailing
/// numeric identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingIdPolicy {
    /// Log a warning, emit a skip event, and continue with the next card.
    Skip,
    /// Fail the whole run.
    Abort,
}

impl MissingIdPolicy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Abort => "abort",
        }
    }
}

impl std::str::FromStr for MissingIdPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "abort" => Ok(Self::Abort),
            other => Err(format!("unknown policy \"{other}\" (expected skip or abort)")),
        }
    }
}

impl std::fmt::Display for MissingIdPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings applied to every record of a sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Listing endpoint; the page index is appended as `?page=<n>`.
    pub base_url: String,
    /// Catalog category tag stamped on every record.
    pub category: String,
    /// ISO 4217 currency code stamped on every record.
    pub currency: String,
    /// Upper bound on pages visited before the run fails.
    pub max_pages: u32,
    pub missing_id_policy: MissingIdPolicy,
    /// Skip (with a warning) product cards whose markup cannot be extracted
    /// instead of failing the run.
    pub skip_malformed: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LISTING_BASE_URL.to_owned(),
            category: "small_appliance".to_owned(),
            currency: "EUR".to_owned(),
            max_pages: 500,
            missing_id_policy: MissingIdPolicy::Skip,
            skip_malformed: false,
        }
    }
}
