use std::path::PathBuf;
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub data_path: PathBuf,
    pub settings_path: PathBuf,
    pub session_path: Option<PathBuf>,
    pub session_cookie: String,
    pub enable_debug_metrics: bool,
    /// Row cap for renders when the pagination feature is disabled.
    pub max_rows_unpaginated: usize,
    pub shutdown_drain: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/users.json"),
            settings_path: PathBuf::from("data/app_settings.json"),
            session_path: Some(PathBuf::from("data/sessions.json")),
            session_cookie: "session_id".to_string(),
            enable_debug_metrics: false,
            max_rows_unpaginated: 100,
            shutdown_drain: Duration::from_millis(5000),
        }
    }
}

pub fn validate_startup_config(config: &ServerConfig) -> Result<(), String> {
    if config.session_cookie.is_empty()
        || !config
            .session_cookie
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(format!(
            "session cookie name must be a non-empty token: {:?}",
            config.session_cookie
        ));
    }
    if config.max_rows_unpaginated == 0 {
        return Err("max_rows_unpaginated must be > 0".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes_validation() {
        validate_startup_config(&ServerConfig::default()).expect("defaults valid");
    }

    #[test]
    fn cookie_name_must_be_a_token() {
        let config = ServerConfig {
            session_cookie: "session id".to_string(),
            ..ServerConfig::default()
        };
        let err = validate_startup_config(&config).expect_err("invalid cookie name");
        assert!(err.contains("cookie"));
    }

    #[test]
    fn unpaginated_row_cap_must_be_positive() {
        let config = ServerConfig {
            max_rows_unpaginated: 0,
            ..ServerConfig::default()
        };
        let err = validate_startup_config(&config).expect_err("zero cap");
        assert!(err.contains("max_rows_unpaginated"));
    }
}
