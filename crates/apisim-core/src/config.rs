//! Engine configuration.

use std::path::Path;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::PageLimits;
use crate::error::Error;

/// Default page size for listings without an entity-specific limit.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Maximum page size for listings without an entity-specific limit.
pub const MAX_PAGE_SIZE: usize = 100;

/// Page size used for trip summaries.
pub const TRIP_SUMMARY_PAGE_SIZE: usize = 200;

/// Days before the reference date covered by the default trip window.
pub const TRIP_LOOKBACK_DAYS: u32 = 30;

/// Months after the reference date covered by the default trip window.
pub const TRIP_LOOKAHEAD_MONTHS: u32 = 12;

/// Query engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Page limits for entities that declare none.
    pub default_page: PageLimits,

    /// Date that relative default windows are computed from.
    /// `None` uses the current UTC date.
    pub reference_date: Option<NaiveDate>,
}

impl EngineConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback page limits.
    pub fn with_default_page(mut self, limits: PageLimits) -> Self {
        self.default_page = limits;
        self
    }

    /// Pin the reference date.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// The date relative windows are computed from.
    pub fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Parse a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    fn validate(&self) -> Result<(), Error> {
        let page = &self.default_page;
        if page.default_size == 0 || page.default_size > page.max_size {
            return Err(Error::Schema(format!(
                "default page size {} must be between 1 and {}",
                page.default_size, page.max_size
            )));
        }
        Ok(())
    }
}
