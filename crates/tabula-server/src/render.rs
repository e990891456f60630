//! HTML fragment rendering. Fragments are assembled with `format!`; every
//! interpolated cell or parameter value passes through `html_escape`, and
//! values embedded in fragment URLs through `urlencode`.

use tabula_model::{
    format_date, Align, AppSettings, ColumnRoster, ColumnSpec, ColumnType, SelectionSummary,
    SortDir, ViewState,
};
use tabula_query::TablePage;

pub(crate) fn html_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn urlencode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for b in raw.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Escapes a value for a JSON string inside a single-quoted `hx-vals`
/// attribute: JSON escapes first, then the entities the attribute context
/// needs (the browser decodes entities before htmx parses the JSON).
fn json_attr(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("&#39;"),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            _ => out.push(c),
        }
    }
    out
}

/// Query-string tail carrying the request-scoped parameters (search term
/// and column filters) so sort and pagination links preserve them.
fn carried_params(view: &ViewState) -> String {
    let mut out = String::new();
    if let Some(q) = &view.search {
        out.push_str(&format!("&q={}", urlencode(q)));
    }
    for (key, value) in &view.filters {
        out.push_str(&format!("&{}={}", urlencode(key), urlencode(value)));
    }
    out
}

pub(crate) fn index_page(settings: &AppSettings) -> String {
    let title = "Tabula";
    format!(
        "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">\
<title>{title}</title>\
<script src=\"https://unpkg.com/htmx.org@1.9.12\"></script>\
<link rel=\"stylesheet\" href=\"/styles/app.css\">\
</head><body>\
<main class=\"container\">\
<h1>{title}</h1>\
<div id=\"header-bar\" hx-get=\"/table-header\" hx-trigger=\"load\"></div>\
<div id=\"table-container\" hx-get=\"/table-data\" hx-trigger=\"load\">Loading&hellip;</div>\
<div id=\"page-size\" hx-get=\"/table-settings\" hx-trigger=\"load\"></div>\
<div id=\"modal-root\"></div>\
</main>\
<!-- version {} / search={} pagination={} -->\
</body></html>",
        env!("CARGO_PKG_VERSION"),
        settings.features.search,
        settings.features.pagination,
    )
}

pub(crate) fn header_fragment(settings: &AppSettings) -> String {
    let mut out = String::from("<div class=\"header-bar\">");
    if settings.features.search {
        out.push_str(
            "<input type=\"search\" name=\"q\" placeholder=\"Search\" \
hx-get=\"/table-data\" hx-target=\"#table-container\" \
hx-trigger=\"keyup changed delay:300ms, search\">",
        );
    }
    if settings.features.column_settings {
        out.push_str(
            "<button class=\"columns-btn\" hx-get=\"/table-settings-modal\" \
hx-target=\"#modal-root\" hx-include=\"[name='q']\">Columns</button>",
        );
    }
    out.push_str("</div>");
    out
}

fn sort_header_cell(col: &ColumnSpec, view: &ViewState, carried: &str) -> String {
    let label = html_escape(&col.label);
    let align_class = match col.align {
        Align::Right => " class=\"num\"",
        Align::Left => "",
    };
    if !col.sortable {
        return format!("<th{align_class}>{label}</th>");
    }
    let is_current = view.sort.key == col.key;
    let next_dir = if is_current {
        view.sort.dir.toggled()
    } else {
        SortDir::Asc
    };
    let indicator = if is_current {
        match view.sort.dir {
            SortDir::Asc => " <span class=\"sort-indicator\">&#9650;</span>",
            SortDir::Desc => " <span class=\"sort-indicator\">&#9660;</span>",
        }
    } else {
        ""
    };
    format!(
        "<th{align_class}><a href=\"#\" hx-get=\"/table-data?sort={}&dir={}{}\" \
hx-target=\"#table-container\">{label}{indicator}</a></th>",
        urlencode(&col.key),
        next_dir.as_str(),
        carried,
    )
}

fn filter_row(columns: &[&ColumnSpec], view: &ViewState, with_selection: bool) -> String {
    let mut out = String::from("<tr class=\"filter-row\">");
    if with_selection {
        out.push_str("<th></th>");
    }
    for col in columns {
        if col.filterable {
            let value = view
                .filters
                .get(&col.key)
                .map(|v| html_escape(v))
                .unwrap_or_default();
            let placeholder = match col.kind {
                ColumnType::Number => "= or min..max",
                _ => "contains",
            };
            out.push_str(&format!(
                "<th><input class=\"filter-input\" name=\"{}\" value=\"{value}\" \
placeholder=\"{placeholder}\" hx-get=\"/table-data\" hx-target=\"#table-container\" \
hx-trigger=\"keyup changed delay:300ms\" hx-include=\"closest tr, [name='q']\"></th>",
                html_escape(&col.key),
            ));
        } else {
            out.push_str("<th></th>");
        }
    }
    out.push_str("</tr>");
    out
}

fn cell_markup(col: &ColumnSpec, view: &ViewState, raw: &str) -> String {
    let text = match col.kind {
        ColumnType::Date => {
            let pattern = view
                .date_pattern(&col.key)
                .or_else(|| col.display_pattern());
            match pattern {
                Some(p) => format_date(raw, p),
                None => raw.to_string(),
            }
        }
        _ => raw.to_string(),
    };
    match col.align {
        Align::Right => format!("<td class=\"num\">{}</td>", html_escape(&text)),
        Align::Left => format!("<td>{}</td>", html_escape(&text)),
    }
}

fn selection_banner(summary: &SelectionSummary, view: &ViewState, current_page: usize) -> String {
    let mut out = format!(
        "<div class=\"selection-banner\">\
<span>{} of {} selected</span>",
        summary.count, summary.total
    );
    let vals_tail = format!(
        "\"q\":\"{}\",\"page\":\"{}\"",
        view.search.as_deref().map(json_attr).unwrap_or_default(),
        current_page,
    );
    if !summary.is_global && summary.total > 0 {
        out.push_str(&format!(
            "<button hx-post=\"/selection\" hx-target=\"#table-container\" \
hx-vals='{{\"action\":\"select_global\",{vals_tail}}}'>Select all {}</button>",
            summary.total
        ));
    }
    if summary.count > 0 {
        out.push_str(&format!(
            "<button hx-post=\"/selection\" hx-target=\"#table-container\" \
hx-vals='{{\"action\":\"clear\",{vals_tail}}}'>Clear</button>",
        ));
    }
    out.push_str("</div>");
    out
}

fn pagination_nav(page: &TablePage, carried: &str) -> String {
    let mut out = String::from("<nav class=\"pagination\">");
    if page.page > 1 {
        out.push_str(&format!(
            "<a href=\"#\" hx-get=\"/table-data?page={}{carried}\" \
hx-target=\"#table-container\">&laquo; Prev</a>",
            page.page - 1
        ));
    }
    out.push_str(&format!(
        "<span>Page {} of {} ({} items)</span>",
        page.page,
        page.page_count.max(1),
        page.total_matched
    ));
    if page.page < page.page_count {
        out.push_str(&format!(
            "<a href=\"#\" hx-get=\"/table-data?page={}{carried}\" \
hx-target=\"#table-container\">Next &raquo;</a>",
            page.page + 1
        ));
    }
    out.push_str("</nav>");
    out
}

pub(crate) fn table_fragment(
    roster: &ColumnRoster,
    settings: &AppSettings,
    view: &ViewState,
    page: &TablePage,
) -> String {
    let columns = roster.active_columns(&view.layout);
    let carried = carried_params(view);
    let with_selection = settings.features.row_selection;

    let mut out = String::from("<div class=\"table-wrap\">");

    if with_selection {
        let summary = view.selection.summary(page.total_matched);
        out.push_str(&selection_banner(&summary, view, page.page));
    }

    out.push_str("<table class=\"data-table\"><thead><tr>");
    if with_selection {
        let page_ids: Vec<&str> = page.rows.iter().map(|r| r.id.as_str()).collect();
        let all_on_page_selected =
            !page_ids.is_empty() && page_ids.iter().all(|id| view.selection.is_selected(id));
        let action = if all_on_page_selected {
            "deselect_page"
        } else {
            "select_page"
        };
        let checked = if all_on_page_selected { " checked" } else { "" };
        out.push_str(&format!(
            "<th><input type=\"checkbox\"{checked} hx-post=\"/selection\" \
hx-target=\"#table-container\" hx-vals='{{\"action\":\"{action}\",\"ids\":\"{}\",\
\"q\":\"{}\",\"page\":\"{}\"}}'></th>",
            json_attr(&page_ids.join(",")),
            view.search.as_deref().map(json_attr).unwrap_or_default(),
            page.page,
        ));
    }
    for col in &columns {
        out.push_str(&sort_header_cell(col, view, &carried));
    }
    out.push_str("</tr>");
    if settings.features.column_filters {
        out.push_str(&filter_row(&columns, view, with_selection));
    }
    out.push_str("</thead><tbody>");

    for record in &page.rows {
        out.push_str("<tr>");
        if with_selection {
            let checked = if view.selection.is_selected(&record.id) {
                " checked"
            } else {
                ""
            };
            out.push_str(&format!(
                "<td><input type=\"checkbox\"{checked} hx-post=\"/selection\" \
hx-target=\"#table-container\" hx-vals='{{\"action\":\"toggle\",\"id\":\"{}\",\
\"q\":\"{}\",\"page\":\"{}\"}}'></td>",
                json_attr(&record.id),
                view.search.as_deref().map(json_attr).unwrap_or_default(),
                page.page,
            ));
        }
        for col in &columns {
            out.push_str(&cell_markup(col, view, &record.cell(&col.key).display()));
        }
        out.push_str("</tr>");
    }
    if page.rows.is_empty() {
        let span = columns.len() + usize::from(with_selection);
        out.push_str(&format!(
            "<tr><td class=\"empty\" colspan=\"{span}\">No matching rows</td></tr>"
        ));
    }
    out.push_str("</tbody></table>");

    if settings.features.pagination {
        out.push_str(&pagination_nav(page, &carried));
    }
    out.push_str("</div>");
    out
}

pub(crate) fn per_page_fragment(settings: &AppSettings, view: &ViewState) -> String {
    let mut options = String::new();
    for &n in &settings.defaults.per_page_options {
        let selected = if n == view.per_page { " selected" } else { "" };
        options.push_str(&format!("<option value=\"{n}\"{selected}>{n}</option>"));
    }
    format!(
        "<form class=\"per-page\">\
<label>Rows per page <select name=\"per_page\" hx-post=\"/table-settings\" \
hx-target=\"#table-container\" hx-include=\"[name='q']\">{options}</select></label></form>"
    )
}

pub(crate) fn settings_modal_fragment(
    roster: &ColumnRoster,
    view: &ViewState,
    search: Option<&str>,
) -> String {
    let mut items = String::new();
    // Session order first, then any roster columns the session has not
    // seen yet (added after the layout was stored).
    let mut keys: Vec<&str> = view.layout.order.iter().map(String::as_str).collect();
    for col in roster.all() {
        if !keys.contains(&col.key.as_str()) {
            keys.push(&col.key);
        }
    }
    for key in keys {
        let Some(col) = roster.get(key) else {
            continue;
        };
        let checked = if view.layout.visible.iter().any(|v| v == key) {
            " checked"
        } else {
            ""
        };
        items.push_str(&format!(
            "<li><input type=\"hidden\" name=\"order\" value=\"{key}\">\
<label><input type=\"checkbox\" name=\"visible\" value=\"{key}\"{checked}> {}</label>",
            html_escape(&col.label),
        ));
        if col.kind == ColumnType::Date {
            let pattern = view
                .date_pattern(key)
                .or_else(|| col.display_pattern())
                .unwrap_or("YYYY-MM-DD");
            items.push_str(&format!(
                "<input class=\"pattern-input\" name=\"pattern_{key}\" value=\"{}\" \
placeholder=\"YYYY-MM-DD\">",
                html_escape(pattern),
            ));
        }
        items.push_str("</li>");
    }
    let q = search.map(html_escape).unwrap_or_default();
    format!(
        "<div class=\"modal\"><div class=\"modal-body\">\
<h2>Columns</h2>\
<form hx-post=\"/table-settings\" hx-target=\"#table-container\">\
<input type=\"hidden\" name=\"q\" value=\"{q}\">\
<ul class=\"column-list\">{items}</ul>\
<div class=\"modal-actions\">\
<button type=\"submit\" hx-on::after-request=\"document.getElementById('modal-root').innerHTML=''\">Apply</button>\
<button type=\"button\" hx-on:click=\"document.getElementById('modal-root').innerHTML=''\">Close</button>\
</div></form></div></div>"
    )
}
