#[allow(dead_code)]
mod support;

use support::{
    fixture_settings, fixture_state, get, memory_config, post_form, session_cookie, spawn,
};

#[tokio::test]
async fn per_page_submission_persists_across_requests() {
    let addr = spawn(fixture_state(fixture_settings(), memory_config())).await;
    let (_, head, _) = get(addr, "/table-data", None).await;
    let cookie = session_cookie(&head).expect("cookie");

    let (status, _, body) = post_form(addr, "/table-settings", "per_page=2", Some(&cookie)).await;
    assert_eq!(status, 200);
    assert!(body.contains("Page 1 of 3 (5 items)"));

    // The setting sticks for later plain renders.
    let (_, _, body) = get(addr, "/table-data", Some(&cookie)).await;
    assert!(body.contains("Page 1 of 3 (5 items)"));
}

#[tokio::test]
async fn off_menu_per_page_submission_is_dropped() {
    let addr = spawn(fixture_state(fixture_settings(), memory_config())).await;
    let (_, head, _) = get(addr, "/table-data", None).await;
    let cookie = session_cookie(&head).expect("cookie");
    let (status, _, body) = post_form(addr, "/table-settings", "per_page=37", Some(&cookie)).await;
    assert_eq!(status, 200);
    assert!(body.contains("Page 1 of 1 (5 items)"));
}

#[tokio::test]
async fn column_settings_submission_reorders_and_hides_columns() {
    let addr = spawn(fixture_state(fixture_settings(), memory_config())).await;
    let (_, head, _) = get(addr, "/table-data", None).await;
    let cookie = session_cookie(&head).expect("cookie");

    let (_, _, body) = post_form(
        addr,
        "/table-settings",
        "order=email&order=full_name&visible=email&visible=full_name",
        Some(&cookie),
    )
    .await;
    // Email column leads, and hidden columns are gone.
    let email_pos = body.find(">Email").expect("email header");
    let name_pos = body.find(">Name").expect("name header");
    assert!(email_pos < name_pos);
    assert!(!body.contains("Status"));
    assert!(!body.contains("active"));

    // Unchecking everything leaves an empty table, not an error.
    let (status, _, body) = post_form(addr, "/table-settings", "order=email", Some(&cookie)).await;
    assert_eq!(status, 200);
    assert!(!body.contains(">Email"));
}

#[tokio::test]
async fn search_term_rides_along_with_settings_updates() {
    let addr = spawn(fixture_state(fixture_settings(), memory_config())).await;
    let (_, head, _) = get(addr, "/table-data", None).await;
    let cookie = session_cookie(&head).expect("cookie");
    let (_, _, body) = post_form(addr, "/table-settings", "per_page=10&q=nasa", Some(&cookie)).await;
    assert!(body.contains("Annie Easley"));
    assert!(!body.contains("Ada Lovelace"));
}

#[tokio::test]
async fn date_pattern_submission_changes_rendering_for_this_session_only() {
    let addr = spawn(fixture_state(fixture_settings(), memory_config())).await;
    let (_, head, _) = get(addr, "/table-data", None).await;
    let cookie = session_cookie(&head).expect("cookie");

    let (_, _, body) = post_form(
        addr,
        "/table-settings",
        "order=full_name&order=created_date&visible=full_name&visible=created_date&pattern_created_date=DD.MM.YYYY",
        Some(&cookie),
    )
    .await;
    assert!(body.contains("09.03.2024"));
    assert!(!body.contains("2024-03-09"));

    // A different session still sees the configured default pattern.
    let (_, _, body) = get(addr, "/table-data", None).await;
    assert!(body.contains("2024-03-09"));
}

#[tokio::test]
async fn selection_toggles_accumulate_and_clear() {
    let mut settings = fixture_settings();
    settings.features.row_selection = true;
    let addr = spawn(fixture_state(settings, memory_config())).await;
    let (_, head, body) = get(addr, "/table-data", None).await;
    let cookie = session_cookie(&head).expect("cookie");
    assert!(body.contains("0 of 5 selected"));

    let (_, _, body) = post_form(addr, "/selection", "action=toggle&id=u1", Some(&cookie)).await;
    assert!(body.contains("1 of 5 selected"));

    let (_, _, body) = post_form(addr, "/selection", "action=toggle&id=u2", Some(&cookie)).await;
    assert!(body.contains("2 of 5 selected"));

    let (_, _, body) = post_form(addr, "/selection", "action=toggle&id=u1", Some(&cookie)).await;
    assert!(body.contains("1 of 5 selected"));

    let (_, _, body) = post_form(addr, "/selection", "action=clear", Some(&cookie)).await;
    assert!(body.contains("0 of 5 selected"));
}

#[tokio::test]
async fn global_selection_uses_exclude_mode() {
    let mut settings = fixture_settings();
    settings.features.row_selection = true;
    let addr = spawn(fixture_state(settings, memory_config())).await;
    let (_, head, _) = get(addr, "/table-data", None).await;
    let cookie = session_cookie(&head).expect("cookie");

    let (_, _, body) =
        post_form(addr, "/selection", "action=select_global", Some(&cookie)).await;
    assert!(body.contains("5 of 5 selected"));
    assert!(!body.contains("Select all"));

    // Untoggling one row carves an exception out of the global selection.
    let (_, _, body) = post_form(addr, "/selection", "action=toggle&id=u3", Some(&cookie)).await;
    assert!(body.contains("4 of 5 selected"));
}

#[tokio::test]
async fn page_selection_selects_only_the_current_page() {
    let mut settings = fixture_settings();
    settings.features.row_selection = true;
    let addr = spawn(fixture_state(settings, memory_config())).await;
    let (_, head, _) = get(addr, "/table-data?sort=age&dir=asc&per_page=2", None).await;
    let cookie = session_cookie(&head).expect("cookie");

    let (_, _, body) = post_form(
        addr,
        "/selection",
        "action=select_page&ids=u4%2Cu5&page=1",
        Some(&cookie),
    )
    .await;
    assert!(body.contains("2 of 5 selected"));
    // Both rows on page 1 now render checked.
    assert_eq!(body.matches("checked").count(), 3, "two rows plus the header box");
}

#[tokio::test]
async fn selection_rerender_keeps_search_and_page() {
    let mut settings = fixture_settings();
    settings.features.row_selection = true;
    let addr = spawn(fixture_state(settings, memory_config())).await;
    let (_, head, _) = get(addr, "/table-data?q=nasa", None).await;
    let cookie = session_cookie(&head).expect("cookie");

    let (_, _, body) = post_form(
        addr,
        "/selection",
        "action=toggle&id=u4&q=nasa",
        Some(&cookie),
    )
    .await;
    assert!(body.contains("1 of 2 selected"));
    assert!(body.contains("Annie Easley"));
    assert!(!body.contains("Ada Lovelace"));
}

#[tokio::test]
async fn unknown_selection_action_is_a_no_op() {
    let mut settings = fixture_settings();
    settings.features.row_selection = true;
    let addr = spawn(fixture_state(settings, memory_config())).await;
    let (_, head, _) = get(addr, "/table-data", None).await;
    let cookie = session_cookie(&head).expect("cookie");
    let (status, _, body) =
        post_form(addr, "/selection", "action=explode", Some(&cookie)).await;
    assert_eq!(status, 200);
    assert!(body.contains("0 of 5 selected"));
}
