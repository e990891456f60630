#![forbid(unsafe_code)]

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tabula_model::{load_dataset, load_settings, ColumnRoster};
use tabula_server::{
    build_router, validate_startup_config, AppState, ServerConfig, SessionStore,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_path(name: &str, default: &str) -> PathBuf {
    PathBuf::from(env::var(name).unwrap_or_else(|_| default.to_string()))
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool("TABULA_LOG_JSON", false) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();

    let bind_addr = env::var("TABULA_BIND").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let config = ServerConfig {
        data_path: env_path("TABULA_DATA_PATH", "data/users.json"),
        settings_path: env_path("TABULA_SETTINGS_PATH", "data/app_settings.json"),
        session_path: match env::var("TABULA_SESSION_PATH") {
            Ok(raw) if raw.is_empty() => None,
            Ok(raw) => Some(PathBuf::from(raw)),
            Err(_) => Some(PathBuf::from("data/sessions.json")),
        },
        enable_debug_metrics: env_bool("TABULA_ENABLE_DEBUG_METRICS", false),
        max_rows_unpaginated: env_usize("TABULA_MAX_ROWS_UNPAGINATED", 100),
        shutdown_drain: Duration::from_millis(env_u64("TABULA_SHUTDOWN_DRAIN_MS", 5000)),
        ..ServerConfig::default()
    };
    validate_startup_config(&config)?;

    let settings = load_settings(&config.settings_path).map_err(|e| e.to_string())?;
    let roster = ColumnRoster::from_settings(&settings).map_err(|e| e.to_string())?;
    let dataset = load_dataset(&config.data_path).map_err(|e| e.to_string())?;
    info!(
        rows = dataset.len(),
        columns = roster.all().len(),
        "dataset loaded"
    );

    let sessions = SessionStore::load(config.session_path.clone());
    let shutdown_drain = config.shutdown_drain;
    let state = AppState::new(dataset, roster, settings, config, sessions);
    let app = build_router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| format!("bind failed on {bind_addr}: {e}"))?;
    info!("tabula-server listening on {bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            tokio::time::sleep(shutdown_drain).await;
        })
        .await
        .map_err(|e| format!("server failed: {e}"))
}
