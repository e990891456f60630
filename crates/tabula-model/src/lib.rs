#![forbid(unsafe_code)]
//! Tabula model SSOT: records, column configuration, application settings,
//! and per-session view state with its pure transitions.

mod columns;
mod dataset;
mod record;
mod selection;
mod settings;
mod view_state;

pub use columns::{
    format_date, Align, ColumnRoster, ColumnSpec, ColumnType, COLUMN_KEY_MAX_LEN,
};
pub use dataset::{load_dataset, Dataset};
pub use record::{CellValue, Record};
pub use selection::{Selection, SelectionAction, SelectionMode, SelectionSummary};
pub use settings::{
    load_settings, AppSettings, ColumnOverride, Defaults, Features, DEFAULT_PER_PAGE,
    DEFAULT_PER_PAGE_OPTIONS,
};
pub use view_state::{ColumnLayout, SortDir, SortSpec, ViewState};

pub const CRATE_NAME: &str = "tabula-model";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationError {}
