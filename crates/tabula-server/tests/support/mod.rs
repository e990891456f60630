use serde_json::json;
use std::net::SocketAddr;
use tabula_model::{AppSettings, ColumnRoster, Dataset, Defaults};
use tabula_server::{build_router, AppState, ServerConfig, SessionStore};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub fn fixture_dataset() -> Dataset {
    Dataset::from_json(&json!([
        {"id": "u1", "full_name": "Ada Lovelace", "email": "ada@calc.io", "country": "UK",
         "status": "active", "age": 36, "balance_eur": 1250.50, "created_date": "2024-03-09"},
        {"id": "u2", "full_name": "Grace Hopper", "email": "grace@navy.mil", "country": "US",
         "status": "active", "age": 45, "balance_eur": 310.00, "created_date": "2024-01-15"},
        {"id": "u3", "full_name": "Alan Turing", "email": "alan@bletchley.uk", "country": "UK",
         "status": "inactive", "age": 41, "balance_eur": 1250.50, "created_date": "2024-03-08"},
        {"id": "u4", "full_name": "Annie Easley", "email": "annie@nasa.gov", "country": "US",
         "status": "active", "age": 22, "balance_eur": 89.90, "created_date": "2023-11-30"},
        {"id": "u5", "full_name": "Katherine Johnson", "email": "kj@nasa.gov", "country": "US",
         "status": "pending", "age": 33, "balance_eur": 510.00, "created_date": "2024-02-02"},
    ]))
    .expect("fixture dataset")
}

pub fn fixture_settings() -> AppSettings {
    AppSettings {
        defaults: Defaults {
            per_page: 10,
            per_page_options: vec![1, 2, 10, 25],
        },
        ..AppSettings::default()
    }
}

pub fn fixture_state(settings: AppSettings, config: ServerConfig) -> AppState {
    let roster = ColumnRoster::from_settings(&settings).expect("roster");
    AppState::new(
        fixture_dataset(),
        roster,
        settings,
        config,
        SessionStore::load(None),
    )
}

pub fn memory_config() -> ServerConfig {
    ServerConfig {
        session_path: None,
        ..ServerConfig::default()
    }
}

pub async fn spawn(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    let app = build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    addr
}

pub async fn send_raw(addr: SocketAddr, request: &str) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    stream
        .write_all(request.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("status");
    (status, head.to_string(), body.to_string())
}

pub async fn get(addr: SocketAddr, path: &str, cookie: Option<&str>) -> (u16, String, String) {
    let cookie_line = cookie
        .map(|c| format!("Cookie: {c}\r\n"))
        .unwrap_or_default();
    let request =
        format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\n{cookie_line}Connection: close\r\n\r\n");
    send_raw(addr, &request).await
}

pub async fn post_form(
    addr: SocketAddr,
    path: &str,
    body: &str,
    cookie: Option<&str>,
) -> (u16, String, String) {
    let cookie_line = cookie
        .map(|c| format!("Cookie: {c}\r\n"))
        .unwrap_or_default();
    let request = format!(
        "POST {path} HTTP/1.1\r\nHost: {addr}\r\n{cookie_line}\
Content-Type: application/x-www-form-urlencoded\r\nContent-Length: {}\r\n\
Connection: close\r\n\r\n{body}",
        body.len()
    );
    send_raw(addr, &request).await
}

/// Pulls the `session_id=<value>` pair out of a response's `set-cookie`.
pub fn session_cookie(head: &str) -> Option<String> {
    head.lines()
        .find(|line| line.to_ascii_lowercase().starts_with("set-cookie:"))
        .and_then(|line| line.split_once(':'))
        .and_then(|(_, value)| value.trim().split(';').next().map(str::to_string))
}

/// Order in which the needles appear in the haystack; panics if one is
/// missing.
pub fn appearance_order(haystack: &str, needles: &[&str]) -> Vec<usize> {
    needles
        .iter()
        .map(|needle| haystack.find(needle).unwrap_or_else(|| panic!("missing {needle}")))
        .collect()
}
