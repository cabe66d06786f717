use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ScanResult;
use crate::record::LayoutOptions;

/// Scanning behavior shared by every scan a `RowMapper` runs.
///
/// ```json
/// { "strict": false, "separator": "__" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Fail on result columns no field maps to.
    pub strict: bool,
    /// Joins a nested record's prefix and its column names.
    pub separator: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            strict: true,
            separator: ".".to_string(),
        }
    }
}

impl ScanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn from_json(json: &str) -> ScanResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> ScanResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            separator: self.separator.clone(),
        }
    }
}
