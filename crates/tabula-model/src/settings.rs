use crate::columns::{Align, ColumnType};
use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_PER_PAGE: usize = 10;
pub const DEFAULT_PER_PAGE_OPTIONS: [usize; 4] = [10, 25, 50, 100];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    pub search: bool,
    pub pagination: bool,
    pub column_settings: bool,
    pub column_filters: bool,
    pub row_selection: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            search: true,
            pagination: true,
            column_settings: true,
            column_filters: false,
            row_selection: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub per_page: usize,
    pub per_page_options: Vec<usize>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            per_page_options: DEFAULT_PER_PAGE_OPTIONS.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnOverride {
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<ColumnType>,
    pub sortable: Option<bool>,
    pub filterable: Option<bool>,
    pub searchable: Option<bool>,
    pub align: Option<Align>,
    pub default_pattern: Option<String>,
    pub custom_pattern: Option<String>,
}

/// Application settings (`app_settings.json`): feature toggles, table
/// defaults, and per-column behavior overrides. Read once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub features: Features,
    pub defaults: Defaults,
    pub columns: BTreeMap<String, ColumnOverride>,
}

impl AppSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.defaults.per_page == 0 {
            return Err(ValidationError("defaults.per_page must be > 0".to_string()));
        }
        if self.defaults.per_page_options.is_empty() {
            return Err(ValidationError(
                "defaults.per_page_options must not be empty".to_string(),
            ));
        }
        if self.defaults.per_page_options.iter().any(|&n| n == 0) {
            return Err(ValidationError(
                "defaults.per_page_options entries must be > 0".to_string(),
            ));
        }
        if !self
            .defaults
            .per_page_options
            .contains(&self.defaults.per_page)
        {
            return Err(ValidationError(format!(
                "defaults.per_page {} is not offered in per_page_options",
                self.defaults.per_page
            )));
        }
        Ok(())
    }
}

/// Loads settings from disk. A missing file falls back to built-in
/// defaults; a malformed file is a fatal configuration error.
pub fn load_settings(path: &Path) -> Result<AppSettings, ValidationError> {
    if !path.exists() {
        return Ok(AppSettings::default());
    }
    let bytes = std::fs::read(path)
        .map_err(|e| ValidationError(format!("failed to read {}: {e}", path.display())))?;
    let settings: AppSettings = serde_json::from_slice(&bytes)
        .map_err(|e| ValidationError(format!("malformed settings {}: {e}", path.display())))?;
    settings.validate()?;
    Ok(settings)
}
