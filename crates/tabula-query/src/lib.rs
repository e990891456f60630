#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tabula_model::{CellValue, ColumnRoster, ColumnType, Record, SortDir, SortSpec, ViewState};

pub const CRATE_NAME: &str = "tabula-query";

#[derive(Debug)]
pub struct QueryError(pub String);

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for QueryError {}

/// One table query: the slice of a `ViewState` the engine acts on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableQuery {
    pub filters: BTreeMap<String, String>,
    pub search: Option<String>,
    pub sort: SortSpec,
    pub page: usize,
    pub per_page: usize,
}

impl TableQuery {
    #[must_use]
    pub fn from_view_state(view: &ViewState) -> Self {
        Self {
            filters: view.filters.clone(),
            search: view.search.clone(),
            sort: view.sort.clone(),
            page: view.page,
            per_page: view.per_page,
        }
    }
}

/// One rendered page plus the metadata pagination controls need.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablePage {
    pub rows: Vec<Record>,
    pub total_matched: usize,
    pub page: usize,
    pub page_count: usize,
    pub per_page: usize,
}

/// Runs the full pipeline: column filters, free-text search, stable sort
/// with id tiebreak, page clamp, page window. Pure; the record collection
/// is only read.
pub fn run_table_query(
    records: &[Record],
    roster: &ColumnRoster,
    query: &TableQuery,
) -> Result<TablePage, QueryError> {
    validate_query(roster, query)?;

    let mut matched: Vec<&Record> = records
        .iter()
        .filter(|record| matches_filters(record, roster, &query.filters))
        .filter(|record| matches_search(record, roster, query.search.as_deref()))
        .collect();

    sort_rows(&mut matched, &query.sort);

    let total_matched = matched.len();
    let page_count = total_matched.div_ceil(query.per_page);
    let page = clamp_page(query.page, page_count);

    let start = (page - 1) * query.per_page;
    let rows = matched
        .into_iter()
        .skip(start)
        .take(query.per_page)
        .cloned()
        .collect();

    Ok(TablePage {
        rows,
        total_matched,
        page,
        page_count,
        per_page: query.per_page,
    })
}

fn validate_query(roster: &ColumnRoster, query: &TableQuery) -> Result<(), QueryError> {
    if query.per_page == 0 {
        return Err(QueryError("per_page must be > 0".to_string()));
    }
    if !roster.is_sortable(&query.sort.key) {
        return Err(QueryError(format!(
            "sort column is not sortable: {}",
            query.sort.key
        )));
    }
    for key in query.filters.keys() {
        if !roster.is_filterable(key) {
            return Err(QueryError(format!(
                "filter references a non-filterable column: {key}"
            )));
        }
    }
    Ok(())
}

/// Clamps a requested page into `[1, page_count]`; page 1 when nothing
/// matched.
#[must_use]
pub fn clamp_page(page: usize, page_count: usize) -> usize {
    if page_count == 0 {
        1
    } else {
        page.clamp(1, page_count)
    }
}

fn matches_filters(
    record: &Record,
    roster: &ColumnRoster,
    filters: &BTreeMap<String, String>,
) -> bool {
    filters.iter().all(|(key, needle)| {
        if needle.is_empty() {
            return true;
        }
        let cell = record.cell(key);
        match roster.get(key).map(|c| c.kind) {
            Some(ColumnType::Number) => number_matches(&cell, needle),
            _ => cell
                .display()
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        }
    })
}

/// Number filters accept an exact value or an inclusive `min..max` range;
/// either bound may be omitted. Unparsable input matches nothing.
fn number_matches(cell: &CellValue, needle: &str) -> bool {
    let Some(value) = cell.as_number() else {
        return false;
    };
    if let Some((lo, hi)) = needle.split_once("..") {
        let lo_ok = lo.trim().is_empty() || lo.trim().parse::<f64>().is_ok_and(|n| value >= n);
        let hi_ok = hi.trim().is_empty() || hi.trim().parse::<f64>().is_ok_and(|n| value <= n);
        let bounds_parse = (lo.trim().is_empty() || lo.trim().parse::<f64>().is_ok())
            && (hi.trim().is_empty() || hi.trim().parse::<f64>().is_ok());
        bounds_parse && lo_ok && hi_ok
    } else {
        needle.trim().parse::<f64>().is_ok_and(|n| value == n)
    }
}

fn matches_search(record: &Record, roster: &ColumnRoster, search: Option<&str>) -> bool {
    let Some(term) = search else {
        return true;
    };
    let term = term.to_lowercase();
    if term.is_empty() {
        return true;
    }
    roster
        .searchable_keys()
        .iter()
        .any(|key| record.cell(key).display().to_lowercase().contains(&term))
}

fn sort_rows(rows: &mut [&Record], sort: &SortSpec) {
    rows.sort_by(|a, b| {
        let ord = a.cell(&sort.key).sort_cmp(&b.cell(&sort.key));
        let ord = match sort.dir {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        };
        // Id tiebreak keeps pagination windows disjoint under equal keys.
        ord.then_with(|| a.id.cmp(&b.id))
    });
}
