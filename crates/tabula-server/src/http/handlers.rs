use crate::render;
use crate::sessions::SessionStore;
use crate::{sha256_hex, AppState};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::Ordering;
use std::time::Instant;
use tabula_api::{
    parse_form_body, parse_selection_form, parse_settings_form, parse_table_params,
    resolve_view_state, ApiError, ApiErrorCode, TableParams,
};
use tabula_model::ViewState;
use tabula_query::{run_table_query, QueryError, TableQuery};
use tracing::{error, info};

pub(crate) fn make_request_id(state: &AppState) -> String {
    let id = state.request_id_seed.fetch_add(1, Ordering::Relaxed);
    format!("req-{id:016x}")
}

pub(crate) fn propagated_request_id(headers: &HeaderMap, state: &AppState) -> String {
    if let Some(raw) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    make_request_id(state)
}

pub(crate) fn with_request_id(mut response: Response, request_id: &str) -> Response {
    if let Ok(v) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert("x-request-id", v);
    }
    response
}

pub(crate) fn api_error_response(status: StatusCode, err: ApiError) -> Response {
    (status, Json(json!({"error": err}))).into_response()
}

fn query_error_response(err: &QueryError) -> Response {
    error!("table query failed: {err}");
    api_error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        ApiError::internal(err.to_string()),
    )
}

pub(crate) fn session_id_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get("cookie")
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|part| {
            let (key, value) = part.trim().split_once('=')?;
            (key == cookie_name && !value.is_empty()).then(|| value.to_string())
        })
}

pub(crate) fn set_session_cookie(response: &mut Response, cookie_name: &str, session_id: &str) {
    let cookie = format!("{cookie_name}={session_id}; Path=/; HttpOnly; SameSite=Lax");
    if let Ok(v) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert("set-cookie", v);
    }
}

/// Looks up the session named by the request cookie. An unknown or absent
/// cookie yields a fresh session id and `created = true`; the caller sets
/// the cookie on its response.
async fn session_context(
    state: &AppState,
    headers: &HeaderMap,
) -> (String, Option<ViewState>, bool) {
    if let Some(sid) = session_id_from_headers(headers, &state.config.session_cookie) {
        if let Some(view) = state.sessions.get(&sid).await {
            return (sid, Some(view), false);
        }
    }
    (SessionStore::new_session_id(), None, true)
}

/// Runs the query engine for a resolved view and renders the table
/// fragment. With pagination disabled the render is capped to the
/// configured row limit instead.
fn render_table(state: &AppState, view: &ViewState) -> Result<String, QueryError> {
    let effective = if state.settings.features.pagination {
        view.clone()
    } else {
        view.clone()
            .with_per_page(state.config.max_rows_unpaginated)
            .with_page(1)
    };
    let page = run_table_query(
        state.dataset.records(),
        &state.roster,
        &TableQuery::from_view_state(&effective),
    )?;
    Ok(render::table_fragment(
        &state.roster,
        &state.settings,
        &effective,
        &page,
    ))
}

async fn finish_html(
    state: &AppState,
    route: &'static str,
    request_id: &str,
    started: Instant,
    body: String,
    new_session: Option<&str>,
) -> Response {
    let mut response = Html(body).into_response();
    if let Some(sid) = new_session {
        set_session_cookie(&mut response, &state.config.session_cookie, sid);
    }
    state
        .metrics
        .observe_request(route, StatusCode::OK, started.elapsed())
        .await;
    with_request_id(response, request_id)
}

pub(crate) async fn index_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    // Establish the session here so the fragment loads fired by the page
    // all arrive with the same cookie.
    let (sid, _existing, created) = session_context(&state, &headers).await;
    if created {
        state
            .sessions
            .put(&sid, ViewState::initial(&state.settings, &state.roster))
            .await;
    }
    let body = render::index_page(&state.settings);
    finish_html(
        &state,
        "/",
        &request_id,
        started,
        body,
        created.then_some(sid.as_str()),
    )
    .await
}

pub(crate) async fn table_header_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let body = render::header_fragment(&state.settings);
    finish_html(&state, "/table-header", &request_id, started, body, None).await
}

pub(crate) async fn table_data_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let (sid, session, created) = session_context(&state, &headers).await;

    let query: BTreeMap<String, String> = params.into_iter().collect();
    let mut table_params = parse_table_params(&query, &state.roster);
    if !state.settings.features.search {
        table_params.search = None;
    }
    let view = resolve_view_state(&table_params, session.as_ref(), &state.settings, &state.roster);
    info!(
        request_id = %request_id,
        route = "/table-data",
        sort = %view.sort.key,
        dir = view.sort.dir.as_str(),
        page = view.page,
        "table render"
    );

    match render_table(&state, &view) {
        Ok(body) => {
            state.sessions.put(&sid, view).await;
            finish_html(
                &state,
                "/table-data",
                &request_id,
                started,
                body,
                created.then_some(sid.as_str()),
            )
            .await
        }
        Err(e) => {
            let resp = query_error_response(&e);
            state
                .metrics
                .observe_request(
                    "/table-data",
                    StatusCode::INTERNAL_SERVER_ERROR,
                    started.elapsed(),
                )
                .await;
            with_request_id(resp, &request_id)
        }
    }
}

pub(crate) async fn per_page_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    if !state.settings.features.pagination {
        return finish_html(
            &state,
            "/table-settings",
            &request_id,
            started,
            String::new(),
            None,
        )
        .await;
    }
    let (sid, session, created) = session_context(&state, &headers).await;
    let view = session
        .unwrap_or_else(|| ViewState::initial(&state.settings, &state.roster));
    let body = render::per_page_fragment(&state.settings, &view);
    state.sessions.put(&sid, view).await;
    finish_html(
        &state,
        "/table-settings",
        &request_id,
        started,
        body,
        created.then_some(sid.as_str()),
    )
    .await
}

pub(crate) async fn settings_modal_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    if !state.settings.features.column_settings {
        return finish_html(
            &state,
            "/table-settings-modal",
            &request_id,
            started,
            String::new(),
            None,
        )
        .await;
    }
    let (sid, session, created) = session_context(&state, &headers).await;
    let view = session
        .unwrap_or_else(|| ViewState::initial(&state.settings, &state.roster));
    let body = render::settings_modal_fragment(
        &state.roster,
        &view,
        params.get("q").map(String::as_str).filter(|s| !s.is_empty()),
    );
    state.sessions.put(&sid, view).await;
    finish_html(
        &state,
        "/table-settings-modal",
        &request_id,
        started,
        body,
        created.then_some(sid.as_str()),
    )
    .await
}

pub(crate) async fn settings_update_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let (sid, session, created) = session_context(&state, &headers).await;

    let pairs = parse_form_body(&body);
    let update = parse_settings_form(&pairs);
    info!(
        request_id = %request_id,
        route = "/table-settings",
        per_page = ?update.per_page,
        order = ?update.order,
        visible = ?update.visible,
        "settings update"
    );
    let base = session.unwrap_or_else(|| ViewState::initial(&state.settings, &state.roster));
    let updated =
        tabula_api::apply_settings_update(base, &update, &state.settings, &state.roster);

    let mut table_params = TableParams {
        search: update.search.clone(),
        ..TableParams::default()
    };
    if !state.settings.features.search {
        table_params.search = None;
    }
    let view = resolve_view_state(&table_params, Some(&updated), &state.settings, &state.roster);

    match render_table(&state, &view) {
        Ok(fragment) => {
            state.sessions.put(&sid, view).await;
            finish_html(
                &state,
                "/table-settings",
                &request_id,
                started,
                fragment,
                created.then_some(sid.as_str()),
            )
            .await
        }
        Err(e) => {
            let resp = query_error_response(&e);
            state
                .metrics
                .observe_request(
                    "/table-settings",
                    StatusCode::INTERNAL_SERVER_ERROR,
                    started.elapsed(),
                )
                .await;
            with_request_id(resp, &request_id)
        }
    }
}

pub(crate) async fn selection_update_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let (sid, session, created) = session_context(&state, &headers).await;

    let pairs = parse_form_body(&body);
    let base = session.unwrap_or_else(|| ViewState::initial(&state.settings, &state.roster));
    let selection = match parse_selection_form(&pairs) {
        Some(action) => base.selection.clone().apply(action),
        None => base.selection.clone(),
    };
    let updated = base.with_selection(selection);

    let find = |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .filter(|v| !v.is_empty())
    };
    let mut table_params = TableParams {
        search: find("q"),
        page: find("page").and_then(|raw| raw.parse::<usize>().ok()),
        ..TableParams::default()
    };
    if !state.settings.features.search {
        table_params.search = None;
    }
    let view = resolve_view_state(&table_params, Some(&updated), &state.settings, &state.roster);

    match render_table(&state, &view) {
        Ok(fragment) => {
            state.sessions.put(&sid, view).await;
            finish_html(
                &state,
                "/selection",
                &request_id,
                started,
                fragment,
                created.then_some(sid.as_str()),
            )
            .await
        }
        Err(e) => {
            let resp = query_error_response(&e);
            state
                .metrics
                .observe_request(
                    "/selection",
                    StatusCode::INTERNAL_SERVER_ERROR,
                    started.elapsed(),
                )
                .await;
            with_request_id(resp, &request_id)
        }
    }
}

const STYLESHEET: &str = include_str!("../../assets/app.css");

pub(crate) async fn styles_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let etag = format!("\"{}\"", sha256_hex(STYLESHEET.as_bytes()));

    let not_modified = headers
        .get("if-none-match")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == etag);
    let mut response = if not_modified {
        StatusCode::NOT_MODIFIED.into_response()
    } else {
        let mut resp = Response::new(axum::body::Body::from(STYLESHEET));
        resp.headers_mut().insert(
            "content-type",
            HeaderValue::from_static("text/css; charset=utf-8"),
        );
        resp
    };
    response
        .headers_mut()
        .insert("cache-control", HeaderValue::from_static("public, max-age=300"));
    if let Ok(v) = HeaderValue::from_str(&etag) {
        response.headers_mut().insert("etag", v);
    }
    let status = response.status();
    state
        .metrics
        .observe_request("/styles/app.css", status, started.elapsed())
        .await;
    with_request_id(response, &request_id)
}

pub(crate) async fn healthz_handler(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let request_id = make_request_id(&state);
    let resp = (StatusCode::OK, "ok").into_response();
    state
        .metrics
        .observe_request("/healthz", StatusCode::OK, started.elapsed())
        .await;
    with_request_id(resp, &request_id)
}

pub(crate) async fn readyz_handler(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let request_id = make_request_id(&state);
    // The dataset is loaded before the listener binds; once serving, ready.
    let resp = (StatusCode::OK, "ready").into_response();
    state
        .metrics
        .observe_request("/readyz", StatusCode::OK, started.elapsed())
        .await;
    with_request_id(resp, &request_id)
}

pub(crate) async fn metrics_handler(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let request_id = make_request_id(&state);
    if !state.config.enable_debug_metrics {
        let resp = api_error_response(
            StatusCode::NOT_FOUND,
            ApiError::new(
                ApiErrorCode::NotFound,
                "debug endpoint disabled",
                json!({}),
            ),
        );
        state
            .metrics
            .observe_request("/debug/metrics", StatusCode::NOT_FOUND, started.elapsed())
            .await;
        return with_request_id(resp, &request_id);
    }
    let payload = state.metrics.snapshot().await;
    let resp = Json(json!({
        "server": {
            "crate": crate::CRATE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "config_schema_version": crate::config::CONFIG_SCHEMA_VERSION,
        },
        "dataset_rows": state.dataset.len(),
        "sessions": state.sessions.len().await,
        "requests": payload
    }))
    .into_response();
    state
        .metrics
        .observe_request("/debug/metrics", StatusCode::OK, started.elapsed())
        .await;
    with_request_id(resp, &request_id)
}
