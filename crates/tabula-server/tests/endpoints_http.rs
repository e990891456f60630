#[allow(dead_code)]
mod support;

use support::{
    appearance_order, fixture_settings, fixture_state, get, memory_config, session_cookie, spawn,
};
use tabula_server::ServerConfig;

#[tokio::test]
async fn index_serves_the_page_shell() {
    let addr = spawn(fixture_state(fixture_settings(), memory_config())).await;
    let (status, head, body) = get(addr, "/", None).await;
    assert_eq!(status, 200);
    assert!(head.to_ascii_lowercase().contains("content-type: text/html"));
    assert!(body.contains("id=\"table-container\""));
    assert!(body.contains("/styles/app.css"));
}

#[tokio::test]
async fn table_data_sets_a_session_cookie_and_renders_rows() {
    let addr = spawn(fixture_state(fixture_settings(), memory_config())).await;
    let (status, head, body) = get(addr, "/table-data", None).await;
    assert_eq!(status, 200);
    let cookie = session_cookie(&head).expect("session cookie on first contact");
    assert!(cookie.starts_with("session_id="));
    assert!(body.contains("Ada Lovelace"));
    assert!(head.contains("x-request-id"));

    // The cookie is reused, not reissued.
    let (_, head, _) = get(addr, "/table-data", Some(&cookie)).await;
    assert!(session_cookie(&head).is_none());
}

#[tokio::test]
async fn default_order_is_created_date_descending() {
    let addr = spawn(fixture_state(fixture_settings(), memory_config())).await;
    let (_, _, body) = get(addr, "/table-data", None).await;
    let order = appearance_order(
        &body,
        &["Ada Lovelace", "Alan Turing", "Katherine Johnson", "Grace Hopper", "Annie Easley"],
    );
    assert!(order.windows(2).all(|w| w[0] < w[1]), "rows out of order");
}

#[tokio::test]
async fn sort_request_persists_in_the_session() {
    let addr = spawn(fixture_state(fixture_settings(), memory_config())).await;
    let (_, head, _) = get(addr, "/table-data?sort=age&dir=asc", None).await;
    let cookie = session_cookie(&head).expect("cookie");

    // A later request without sort parameters keeps the session's sort.
    let (_, _, body) = get(addr, "/table-data", Some(&cookie)).await;
    let order = appearance_order(&body, &["Annie Easley", "Katherine Johnson", "Ada Lovelace"]);
    assert!(order.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn search_and_filters_narrow_the_table() {
    let addr = spawn(fixture_state(fixture_settings(), memory_config())).await;
    let (_, _, body) = get(addr, "/table-data?q=nasa", None).await;
    assert!(body.contains("Annie Easley"));
    assert!(body.contains("Katherine Johnson"));
    assert!(!body.contains("Ada Lovelace"));

    let (_, _, body) = get(addr, "/table-data?country=uk", None).await;
    assert!(body.contains("Ada Lovelace"));
    assert!(body.contains("Alan Turing"));
    assert!(!body.contains("Grace Hopper"));

    let (_, _, body) = get(addr, "/table-data?age=33..41", None).await;
    assert!(body.contains("Ada Lovelace"));
    assert!(!body.contains("Grace Hopper"));
}

#[tokio::test]
async fn invalid_parameters_degrade_instead_of_erroring() {
    let addr = spawn(fixture_state(fixture_settings(), memory_config())).await;
    let (status, _, body) =
        get(addr, "/table-data?sort=bogus&dir=sideways&page=banana&per_page=0", None).await;
    assert_eq!(status, 200);
    assert!(body.contains("Ada Lovelace"));
}

#[tokio::test]
async fn out_of_range_page_clamps() {
    let addr = spawn(fixture_state(fixture_settings(), memory_config())).await;
    let (_, _, body) = get(addr, "/table-data?per_page=2&page=99", None).await;
    assert!(body.contains("Page 3 of 3 (5 items)"));
}

#[tokio::test]
async fn pagination_splits_pages_with_no_overlap() {
    let addr = spawn(fixture_state(fixture_settings(), memory_config())).await;
    let (_, head, body1) = get(addr, "/table-data?sort=age&dir=asc&per_page=2&page=1", None).await;
    let cookie = session_cookie(&head).expect("cookie");
    assert!(body1.contains("Annie Easley"));
    assert!(body1.contains("Katherine Johnson"));
    assert!(!body1.contains("Grace Hopper"));
    assert!(body1.contains("Page 1 of 3 (5 items)"));

    let (_, _, body2) = get(addr, "/table-data?page=2", Some(&cookie)).await;
    assert!(body2.contains("Ada Lovelace"));
    assert!(!body2.contains("Annie Easley"));
}

#[tokio::test]
async fn disabled_search_feature_ignores_the_term() {
    let mut settings = fixture_settings();
    settings.features.search = false;
    let addr = spawn(fixture_state(settings, memory_config())).await;
    let (_, _, body) = get(addr, "/table-data?q=nasa", None).await;
    assert!(body.contains("Ada Lovelace"));
    assert!(body.contains("Page 1 of 1 (5 items)"));
}

#[tokio::test]
async fn disabled_pagination_renders_capped_rows_without_nav() {
    let mut settings = fixture_settings();
    settings.features.pagination = false;
    let addr = spawn(fixture_state(
        settings,
        ServerConfig {
            max_rows_unpaginated: 3,
            session_path: None,
            ..ServerConfig::default()
        },
    ))
    .await;
    let (_, _, body) = get(addr, "/table-data", None).await;
    assert!(!body.contains("class=\"pagination\""));
    assert_eq!(body.matches("<tr>").count() - 1, 3, "capped row count");

    // The page-size selector is empty when pagination is off.
    let (status, _, body) = get(addr, "/table-settings", None).await;
    assert_eq!(status, 200);
    assert!(body.is_empty());
}

#[tokio::test]
async fn header_and_settings_fragments_follow_feature_toggles() {
    let addr = spawn(fixture_state(fixture_settings(), memory_config())).await;
    let (_, _, body) = get(addr, "/table-header", None).await;
    assert!(body.contains("type=\"search\""));
    assert!(body.contains("/table-settings-modal"));

    let (_, _, body) = get(addr, "/table-settings", None).await;
    assert!(body.contains("per_page"));
    assert!(body.contains("<option value=\"10\" selected>"));

    let (_, _, body) = get(addr, "/table-settings-modal?q=ada", None).await;
    assert!(body.contains("name=\"order\" value=\"full_name\""));
    assert!(body.contains("name=\"q\" value=\"ada\""));

    let mut settings = fixture_settings();
    settings.features.column_settings = false;
    settings.features.search = false;
    let addr = spawn(fixture_state(settings, memory_config())).await;
    let (_, _, body) = get(addr, "/table-header", None).await;
    assert!(!body.contains("type=\"search\""));
    let (_, _, body) = get(addr, "/table-settings-modal", None).await;
    assert!(body.is_empty());
}

#[tokio::test]
async fn stylesheet_supports_etag_revalidation() {
    let addr = spawn(fixture_state(fixture_settings(), memory_config())).await;
    let (status, head, body) = get(addr, "/styles/app.css", None).await;
    assert_eq!(status, 200);
    assert!(head.to_ascii_lowercase().contains("content-type: text/css"));
    assert!(!body.is_empty());
    let etag = head
        .lines()
        .find_map(|line| line.strip_prefix("etag: "))
        .expect("etag header")
        .to_string();

    let request = format!(
        "GET /styles/app.css HTTP/1.1\r\nHost: {addr}\r\nIf-None-Match: {etag}\r\nConnection: close\r\n\r\n"
    );
    let (status, _, _) = support::send_raw(addr, &request).await;
    assert_eq!(status, 304);
}

#[tokio::test]
async fn health_probes_answer() {
    let addr = spawn(fixture_state(fixture_settings(), memory_config())).await;
    let (status, _, body) = get(addr, "/healthz", None).await;
    assert_eq!((status, body.as_str()), (200, "ok"));
    let (status, _, body) = get(addr, "/readyz", None).await;
    assert_eq!((status, body.as_str()), (200, "ready"));
}

#[tokio::test]
async fn debug_metrics_is_gated_by_config() {
    let addr = spawn(fixture_state(fixture_settings(), memory_config())).await;
    let (status, _, _) = get(addr, "/debug/metrics", None).await;
    assert_eq!(status, 404);

    let addr = spawn(fixture_state(
        fixture_settings(),
        ServerConfig {
            enable_debug_metrics: true,
            session_path: None,
            ..ServerConfig::default()
        },
    ))
    .await;
    let (_, _, _) = get(addr, "/table-data", None).await;
    let (status, _, body) = get(addr, "/debug/metrics", None).await;
    assert_eq!(status, 200);
    let payload: serde_json::Value = serde_json::from_str(&body).expect("metrics json");
    assert_eq!(payload["dataset_rows"], 5);
    assert!(payload["requests"]["counts"]
        .as_array()
        .expect("counts")
        .iter()
        .any(|entry| entry["route"] == "/table-data"));
}

#[tokio::test]
async fn unknown_route_is_404() {
    let addr = spawn(fixture_state(fixture_settings(), memory_config())).await;
    let (status, _, _) = get(addr, "/no-such-route", None).await;
    assert_eq!(status, 404);
}
