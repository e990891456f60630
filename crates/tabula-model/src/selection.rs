use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// `ids` holds the selected rows.
    Include,
    /// Every matched row is selected except `ids`.
    Exclude,
}

/// Row selection state. Exclude mode is how "select all matching rows"
/// stays cheap: the exception list is what gets stored, not the matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub mode: SelectionMode,
    pub ids: BTreeSet<String>,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            mode: SelectionMode::Include,
            ids: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionAction {
    Toggle { id: String },
    SelectPage { ids: Vec<String> },
    DeselectPage { ids: Vec<String> },
    SelectGlobal,
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectionSummary {
    pub count: usize,
    pub total: usize,
    pub is_global: bool,
    pub mode: SelectionMode,
}

impl Selection {
    #[must_use]
    pub fn is_selected(&self, id: &str) -> bool {
        match self.mode {
            SelectionMode::Include => self.ids.contains(id),
            SelectionMode::Exclude => !self.ids.contains(id),
        }
    }

    /// Applies one user action, producing the next selection state.
    #[must_use]
    pub fn apply(mut self, action: SelectionAction) -> Self {
        match action {
            SelectionAction::Toggle { id } => {
                // In both modes a toggle flips the id's membership in the
                // exception/selection list.
                if !self.ids.remove(&id) {
                    self.ids.insert(id);
                }
                self
            }
            SelectionAction::SelectPage { ids } => {
                match self.mode {
                    SelectionMode::Include => self.ids.extend(ids),
                    SelectionMode::Exclude => {
                        for id in ids {
                            self.ids.remove(&id);
                        }
                    }
                }
                self
            }
            SelectionAction::DeselectPage { ids } => {
                match self.mode {
                    SelectionMode::Include => {
                        for id in ids {
                            self.ids.remove(&id);
                        }
                    }
                    SelectionMode::Exclude => self.ids.extend(ids),
                }
                self
            }
            SelectionAction::SelectGlobal => Self {
                mode: SelectionMode::Exclude,
                ids: BTreeSet::new(),
            },
            SelectionAction::Clear => Self::default(),
        }
    }

    #[must_use]
    pub fn summary(&self, total_matched: usize) -> SelectionSummary {
        match self.mode {
            SelectionMode::Include => SelectionSummary {
                count: self.ids.len().min(total_matched),
                total: total_matched,
                is_global: false,
                mode: self.mode,
            },
            SelectionMode::Exclude => SelectionSummary {
                count: total_matched.saturating_sub(self.ids.len()),
                total: total_matched,
                is_global: self.ids.is_empty(),
                mode: self.mode,
            },
        }
    }
}
