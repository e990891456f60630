#![forbid(unsafe_code)]

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;
use tabula_model::{AppSettings, ColumnRoster, Dataset};
use tokio::sync::Mutex;

mod config;
mod http;
mod render;
mod sessions;

pub use config::{validate_startup_config, ServerConfig, CONFIG_SCHEMA_VERSION};
pub use sessions::SessionStore;

pub const CRATE_NAME: &str = "tabula-server";

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Per-route request counters and latency samples, exposed through
/// `/debug/metrics` when enabled.
#[derive(Default)]
pub struct RequestMetrics {
    counts: Mutex<HashMap<(String, u16), u64>>,
    latency_ns: Mutex<HashMap<String, Vec<u64>>>,
}

impl RequestMetrics {
    pub(crate) async fn observe_request(&self, route: &str, status: StatusCode, latency: Duration) {
        let mut counts = self.counts.lock().await;
        *counts
            .entry((route.to_string(), status.as_u16()))
            .or_insert(0) += 1;
        drop(counts);
        let mut latency_map = self.latency_ns.lock().await;
        latency_map
            .entry(route.to_string())
            .or_default()
            .push(latency.as_nanos() as u64);
    }

    pub(crate) async fn snapshot(&self) -> Value {
        let counts = self.counts.lock().await;
        let mut by_route: Vec<Value> = counts
            .iter()
            .map(|((route, status), count)| json!({"route": route, "status": status, "count": count}))
            .collect();
        drop(counts);
        by_route.sort_by_key(|v| {
            (
                v["route"].as_str().unwrap_or_default().to_string(),
                v["status"].as_u64().unwrap_or_default(),
            )
        });

        let latency_map = self.latency_ns.lock().await;
        let mut latencies: Vec<Value> = latency_map
            .iter()
            .map(|(route, samples)| {
                let mut sorted = samples.clone();
                sorted.sort_unstable();
                let pct = |p: f64| -> u64 {
                    if sorted.is_empty() {
                        return 0;
                    }
                    let idx = ((sorted.len() as f64) * p).ceil() as usize;
                    sorted[idx.saturating_sub(1).min(sorted.len() - 1)]
                };
                json!({
                    "route": route,
                    "samples": sorted.len(),
                    "p50_ns": pct(0.50),
                    "p95_ns": pct(0.95)
                })
            })
            .collect();
        latencies.sort_by_key(|v| v["route"].as_str().unwrap_or_default().to_string());

        json!({"counts": by_route, "latency": latencies})
    }
}

#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub roster: Arc<ColumnRoster>,
    pub settings: Arc<AppSettings>,
    pub config: Arc<ServerConfig>,
    pub sessions: Arc<SessionStore>,
    pub metrics: Arc<RequestMetrics>,
    pub request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(
        dataset: Dataset,
        roster: ColumnRoster,
        settings: AppSettings,
        config: ServerConfig,
        sessions: SessionStore,
    ) -> Self {
        Self {
            dataset: Arc::new(dataset),
            roster: Arc::new(roster),
            settings: Arc::new(settings),
            config: Arc::new(config),
            sessions: Arc::new(sessions),
            metrics: Arc::new(RequestMetrics::default()),
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(http::handlers::index_handler))
        .route("/table-header", get(http::handlers::table_header_handler))
        .route("/table-data", get(http::handlers::table_data_handler))
        .route(
            "/table-settings",
            get(http::handlers::per_page_handler).post(http::handlers::settings_update_handler),
        )
        .route(
            "/table-settings-modal",
            get(http::handlers::settings_modal_handler),
        )
        .route("/selection", post(http::handlers::selection_update_handler))
        .route("/styles/app.css", get(http::handlers::styles_handler))
        .route("/healthz", get(http::handlers::healthz_handler))
        .route("/readyz", get(http::handlers::readyz_handler))
        .route("/debug/metrics", get(http::handlers::metrics_handler))
        .with_state(state)
}
