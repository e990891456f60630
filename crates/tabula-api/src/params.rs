// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use tabula_model::{ColumnRoster, SelectionAction, SortDir};

pub const SEARCH_TERM_MAX_LEN: usize = 256;

/// Table-view parameters as they arrived on the request, after lenient
/// parsing: anything invalid is simply absent and resolution falls back to
/// session state or configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableParams {
    pub search: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<SortDir>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    pub filters: BTreeMap<String, String>,
}

#[must_use]
pub fn parse_table_params(query: &BTreeMap<String, String>, roster: &ColumnRoster) -> TableParams {
    let search = query
        .get("q")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(|mut s| {
            s.truncate(SEARCH_TERM_MAX_LEN);
            s
        });

    let sort = query
        .get("sort")
        .filter(|key| roster.is_sortable(key))
        .cloned();
    let dir = query.get("dir").and_then(|raw| SortDir::parse(raw));

    let page = query
        .get("page")
        .and_then(|raw| raw.parse::<usize>().ok())
        .filter(|&p| p >= 1);
    let per_page = query
        .get("per_page")
        .and_then(|raw| raw.parse::<usize>().ok())
        .filter(|&n| n >= 1);

    let mut filters = BTreeMap::new();
    for (key, value) in query {
        if value.is_empty() || !roster.is_filterable(key) {
            continue;
        }
        filters.insert(key.clone(), value.clone());
    }

    TableParams {
        search,
        sort,
        dir,
        page,
        per_page,
        filters,
    }
}

/// Splits an `application/x-www-form-urlencoded` body into decoded pairs,
/// preserving order and repeated keys (checkbox groups submit one pair per
/// checked box).
#[must_use]
pub fn parse_form_body(body: &str) -> Vec<(String, String)> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode(key), percent_decode(value))
        })
        .collect()
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => match (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                (Some(hi), Some(lo)) => {
                    out.push(hi * 16 + lo);
                    i += 3;
                }
                _ => {
                    out.push(b'%');
                    i += 1;
                }
            },
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn first<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn all(pairs: &[(String, String)], key: &str) -> Vec<String> {
    pairs
        .iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
        .filter(|v| !v.is_empty())
        .collect()
}

/// The column-settings form body. `order` present means the settings modal
/// was submitted; no checked `visible` box then means every column was
/// unchecked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub per_page: Option<usize>,
    pub order: Option<Vec<String>>,
    pub visible: Option<Vec<String>>,
    pub date_patterns: BTreeMap<String, String>,
    pub search: Option<String>,
}

#[must_use]
pub fn parse_settings_form(pairs: &[(String, String)]) -> SettingsUpdate {
    let mut date_patterns = BTreeMap::new();
    for (key, value) in pairs {
        if let Some(column) = key.strip_prefix("pattern_") {
            if !column.is_empty() {
                date_patterns.insert(column.to_string(), value.trim().to_string());
            }
        }
    }
    let order = if pairs.iter().any(|(k, _)| k == "order") {
        Some(all(pairs, "order"))
    } else {
        None
    };
    let visible = if pairs.iter().any(|(k, _)| k == "visible") {
        Some(all(pairs, "visible"))
    } else {
        None
    };
    SettingsUpdate {
        per_page: first(pairs, "per_page").and_then(|raw| raw.parse::<usize>().ok()),
        order,
        visible,
        date_patterns,
        search: first(pairs, "q")
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    }
}

/// Parses the selection form into a transition plus the table parameters
/// the re-render should keep. Unknown or incomplete actions yield `None`
/// and the handler just re-renders.
#[must_use]
pub fn parse_selection_form(pairs: &[(String, String)]) -> Option<SelectionAction> {
    let action = first(pairs, "action")?;
    match action {
        "toggle" => first(pairs, "id")
            .filter(|id| !id.is_empty())
            .map(|id| SelectionAction::Toggle { id: id.to_string() }),
        "select_page" => first(pairs, "ids").map(|raw| SelectionAction::SelectPage {
            ids: split_csv(raw),
        }),
        "deselect_page" => first(pairs, "ids").map(|raw| SelectionAction::DeselectPage {
            ids: split_csv(raw),
        }),
        "select_global" => Some(SelectionAction::SelectGlobal),
        "clear" => Some(SelectionAction::Clear),
        _ => None,
    }
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
