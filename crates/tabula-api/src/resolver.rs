// SPDX-License-Identifier: Apache-2.0

use crate::params::{SettingsUpdate, TableParams};
use tabula_model::{AppSettings, ColumnLayout, ColumnRoster, SortSpec, ViewState};

/// Merges request parameters over session state over configured defaults
/// and returns the effective view state for this render. Invalid values
/// degrade; this function cannot fail.
///
/// Search, filters, and page are request-scoped. Sort, page size, column
/// layout, date patterns, and selection persist in the session.
#[must_use]
pub fn resolve_view_state(
    params: &TableParams,
    session: Option<&ViewState>,
    settings: &AppSettings,
    roster: &ColumnRoster,
) -> ViewState {
    let initial = ViewState::initial(settings, roster);
    let base = session.cloned().unwrap_or_else(|| initial.clone());

    let sort = match &params.sort {
        Some(key) if roster.is_sortable(key) => SortSpec {
            key: key.clone(),
            dir: params.dir.unwrap_or(tabula_model::SortDir::Asc),
        },
        _ if roster.is_sortable(&base.sort.key) => base.sort.clone(),
        _ => initial.sort.clone(),
    };

    let per_page = params
        .per_page
        .filter(|n| settings.defaults.per_page_options.contains(n))
        .or_else(|| {
            Some(base.per_page).filter(|n| settings.defaults.per_page_options.contains(n))
        })
        .unwrap_or(settings.defaults.per_page);

    base.with_sort(sort)
        .with_per_page(per_page)
        .with_page(params.page.unwrap_or(1))
        .with_search(params.search.clone())
        .with_filters(params.filters.clone())
        .with_layout(sanitize_layout(
            session.map_or(&initial.layout, |s| &s.layout),
            roster,
        ))
}

/// Drops unknown keys from a stored layout and falls back to the full
/// roster when the stored order is empty.
#[must_use]
pub fn sanitize_layout(layout: &ColumnLayout, roster: &ColumnRoster) -> ColumnLayout {
    let order: Vec<String> = layout
        .order
        .iter()
        .filter(|key| roster.get(key).is_some())
        .cloned()
        .collect();
    let visible: Vec<String> = layout
        .visible
        .iter()
        .filter(|key| roster.get(key).is_some())
        .cloned()
        .collect();
    if order.is_empty() {
        ColumnLayout {
            order: roster.keys(),
            visible: roster.keys(),
        }
    } else {
        ColumnLayout { order, visible }
    }
}

/// Applies a settings-form submission to a session state, honoring the
/// feature toggles: page size only when pagination is enabled, layout and
/// date patterns only when column settings are enabled.
#[must_use]
pub fn apply_settings_update(
    state: ViewState,
    update: &SettingsUpdate,
    settings: &AppSettings,
    roster: &ColumnRoster,
) -> ViewState {
    let mut next = state;

    if settings.features.pagination {
        if let Some(per_page) = update.per_page {
            if settings.defaults.per_page_options.contains(&per_page) {
                next = next.with_per_page(per_page);
            }
        }
    }

    if settings.features.column_settings {
        if let Some(order) = &update.order {
            let layout = sanitize_layout(
                &ColumnLayout {
                    order: order.clone(),
                    visible: update.visible.clone().unwrap_or_default(),
                },
                roster,
            );
            next = next.with_layout(layout);
        }
        for (column, pattern) in &update.date_patterns {
            if roster.get(column).is_some() {
                next = next.with_date_pattern(column.clone(), pattern.clone());
            }
        }
    }

    next
}
