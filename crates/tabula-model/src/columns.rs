use crate::settings::AppSettings;
use crate::view_state::ColumnLayout;
use crate::ValidationError;
use serde::{Deserialize, Serialize};

pub const COLUMN_KEY_MAX_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Number,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub key: String,
    pub label: String,
    pub kind: ColumnType,
    pub sortable: bool,
    pub filterable: bool,
    pub searchable: bool,
    pub align: Align,
    pub default_pattern: Option<String>,
    pub custom_pattern: Option<String>,
}

impl ColumnSpec {
    fn new(key: &str, label: &str, kind: ColumnType) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind,
            sortable: true,
            filterable: true,
            searchable: true,
            align: match kind {
                ColumnType::Number => Align::Right,
                _ => Align::Left,
            },
            default_pattern: match kind {
                ColumnType::Date => Some("YYYY-MM-DD".to_string()),
                _ => None,
            },
            custom_pattern: None,
        }
    }

    /// Pattern that governs date rendering for this column.
    #[must_use]
    pub fn display_pattern(&self) -> Option<&str> {
        self.custom_pattern
            .as_deref()
            .or(self.default_pattern.as_deref())
    }
}

/// The declared column set, in canonical display order. Built from the
/// built-in roster merged with `app_settings.json` overrides at startup;
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRoster {
    columns: Vec<ColumnSpec>,
}

fn builtin_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("full_name", "Name", ColumnType::Text),
        ColumnSpec::new("email", "Email", ColumnType::Text),
        ColumnSpec::new("country", "Country", ColumnType::Text),
        ColumnSpec::new("status", "Status", ColumnType::Text),
        ColumnSpec::new("age", "Age", ColumnType::Number),
        ColumnSpec::new("balance_eur", "Balance", ColumnType::Number),
        ColumnSpec::new("created_date", "Created", ColumnType::Date),
    ]
}

impl ColumnRoster {
    pub fn from_settings(settings: &AppSettings) -> Result<Self, ValidationError> {
        let mut columns = builtin_columns();
        for (key, over) in &settings.columns {
            if key.is_empty() || key.len() > COLUMN_KEY_MAX_LEN {
                return Err(ValidationError(format!(
                    "column override key must be 1..={COLUMN_KEY_MAX_LEN} chars: {key:?}"
                )));
            }
            let Some(col) = columns.iter_mut().find(|c| c.key == *key) else {
                return Err(ValidationError(format!(
                    "column override references undeclared column: {key}"
                )));
            };
            if let Some(label) = &over.label {
                col.label = label.clone();
            }
            if let Some(kind) = over.kind {
                col.kind = kind;
            }
            if let Some(sortable) = over.sortable {
                col.sortable = sortable;
            }
            if let Some(filterable) = over.filterable {
                col.filterable = filterable;
            }
            if let Some(searchable) = over.searchable {
                col.searchable = searchable;
            }
            if let Some(align) = over.align {
                col.align = align;
            }
            if over.default_pattern.is_some() {
                col.default_pattern = over.default_pattern.clone();
            }
            if over.custom_pattern.is_some() {
                col.custom_pattern = over.custom_pattern.clone();
            }
        }
        Ok(Self { columns })
    }

    #[must_use]
    pub fn all(&self) -> &[ColumnSpec] {
        &self.columns
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.key == key)
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.key.clone()).collect()
    }

    #[must_use]
    pub fn is_sortable(&self, key: &str) -> bool {
        self.get(key).is_some_and(|c| c.sortable)
    }

    #[must_use]
    pub fn is_filterable(&self, key: &str) -> bool {
        self.get(key).is_some_and(|c| c.filterable)
    }

    #[must_use]
    pub fn searchable_keys(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.searchable)
            .map(|c| c.key.as_str())
            .collect()
    }

    /// Columns to render for a session layout: the layout's order, visible
    /// keys only, unknown keys dropped.
    #[must_use]
    pub fn active_columns(&self, layout: &ColumnLayout) -> Vec<&ColumnSpec> {
        layout
            .order
            .iter()
            .filter(|key| layout.visible.iter().any(|v| v == *key))
            .filter_map(|key| self.get(key))
            .collect()
    }
}

/// Formats a `YYYY-MM-DD` date string through a display pattern built from
/// `YYYY`, `MM`, and `DD` placeholders. Unparsable input passes through.
#[must_use]
pub fn format_date(value: &str, pattern: &str) -> String {
    let mut parts = value.splitn(3, '-');
    let (Some(year), Some(month), Some(day)) = (parts.next(), parts.next(), parts.next()) else {
        return value.to_string();
    };
    let well_formed = year.len() == 4
        && month.len() == 2
        && day.len() == 2
        && [year, month, day]
            .iter()
            .all(|p| p.bytes().all(|b| b.is_ascii_digit()));
    if !well_formed {
        return value.to_string();
    }
    pattern
        .replace("YYYY", year)
        .replace("MM", month)
        .replace("DD", day)
}
