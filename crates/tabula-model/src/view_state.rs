use crate::columns::ColumnRoster;
use crate::selection::Selection;
use crate::settings::AppSettings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: String,
    pub dir: SortDir,
}

/// Session column layout: display order plus the visible subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLayout {
    pub order: Vec<String>,
    pub visible: Vec<String>,
}

/// The resolved parameters governing one table render. Immutable; user
/// actions produce a new state through the `with_*` transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub sort: SortSpec,
    pub filters: BTreeMap<String, String>,
    pub search: Option<String>,
    pub page: usize,
    pub per_page: usize,
    pub layout: ColumnLayout,
    /// Per-session date display overrides, column key to pattern. Column
    /// configuration itself stays immutable at runtime.
    #[serde(default)]
    pub date_patterns: BTreeMap<String, String>,
    pub selection: Selection,
}

impl ViewState {
    /// The state a fresh session starts from.
    #[must_use]
    pub fn initial(settings: &AppSettings, roster: &ColumnRoster) -> Self {
        let keys = roster.keys();
        Self {
            sort: SortSpec {
                key: "created_date".to_string(),
                dir: SortDir::Desc,
            },
            filters: BTreeMap::new(),
            search: None,
            page: 1,
            per_page: settings.defaults.per_page,
            layout: ColumnLayout {
                order: keys.clone(),
                visible: keys,
            },
            date_patterns: BTreeMap::new(),
            selection: Selection::default(),
        }
    }

    #[must_use]
    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    #[must_use]
    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page.max(1);
        self
    }

    #[must_use]
    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search.filter(|s| !s.is_empty());
        self
    }

    #[must_use]
    pub fn with_filters(mut self, filters: BTreeMap<String, String>) -> Self {
        self.filters = filters;
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: ColumnLayout) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn with_date_pattern(mut self, key: String, pattern: String) -> Self {
        if pattern.is_empty() {
            self.date_patterns.remove(&key);
        } else {
            self.date_patterns.insert(key, pattern);
        }
        self
    }

    #[must_use]
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Date pattern effective for a column in this session, if any.
    #[must_use]
    pub fn date_pattern(&self, key: &str) -> Option<&str> {
        self.date_patterns.get(key).map(String::as_str)
    }
}
