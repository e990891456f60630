use std::collections::HashMap;
use std::path::PathBuf;
use tabula_model::ViewState;
use tokio::sync::Mutex;
use tracing::warn;
use ulid::Ulid;

/// In-memory session map keyed by the `session_id` cookie, seeded from and
/// persisted to a JSON file so UI preferences survive restarts. A broken
/// or missing file degrades to an empty store; persistence failures are
/// logged and non-fatal.
pub struct SessionStore {
    path: Option<PathBuf>,
    inner: Mutex<HashMap<String, ViewState>>,
}

impl SessionStore {
    #[must_use]
    pub fn load(path: Option<PathBuf>) -> Self {
        let seeded = match &path {
            Some(p) if p.exists() => match std::fs::read(p)
                .map_err(|e| e.to_string())
                .and_then(|bytes| {
                    serde_json::from_slice::<HashMap<String, ViewState>>(&bytes)
                        .map_err(|e| e.to_string())
                }) {
                Ok(sessions) => sessions,
                Err(e) => {
                    warn!("discarding unreadable session file {}: {e}", p.display());
                    HashMap::new()
                }
            },
            _ => HashMap::new(),
        };
        Self {
            path,
            inner: Mutex::new(seeded),
        }
    }

    #[must_use]
    pub fn new_session_id() -> String {
        Ulid::new().to_string()
    }

    pub async fn get(&self, session_id: &str) -> Option<ViewState> {
        self.inner.lock().await.get(session_id).cloned()
    }

    pub async fn put(&self, session_id: &str, state: ViewState) {
        let snapshot = {
            let mut sessions = self.inner.lock().await;
            sessions.insert(session_id.to_string(), state);
            self.path.as_ref().map(|_| sessions.clone())
        };
        if let (Some(path), Some(sessions)) = (&self.path, snapshot) {
            match serde_json::to_vec_pretty(&sessions) {
                Ok(bytes) => {
                    if let Err(e) = std::fs::write(path, bytes) {
                        warn!("failed to persist sessions to {}: {e}", path.display());
                    }
                }
                Err(e) => warn!("failed to serialize sessions: {e}"),
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}
