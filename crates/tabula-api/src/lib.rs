#![forbid(unsafe_code)]

mod errors;
mod params;
mod resolver;

pub use errors::{ApiError, ApiErrorCode};
pub use params::{
    parse_form_body, parse_selection_form, parse_settings_form, parse_table_params,
    SettingsUpdate, TableParams, SEARCH_TERM_MAX_LEN,
};
pub use resolver::{apply_settings_update, resolve_view_state, sanitize_layout};

pub const CRATE_NAME: &str = "tabula-api";
