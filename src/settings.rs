use once_cell::sync::Lazy;
use std::{env, path::PathBuf, time::Duration};

/// Holds all tunables, read-once from ENV with fallbacks.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub poll_interval: Duration,
    pub empty_queue_retry: Duration,
    pub error_retry: Duration,
    pub request_timeout: Duration,
    pub session_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            base_url: "http://localhost:8080".to_string(),
            poll_interval: Duration::from_secs(10),
            empty_queue_retry: Duration::from_millis(2_000),
            error_retry: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
            session_file: PathBuf::from("ytqueuer-session.json"),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        // optionally load .env
        let _ = dotenvy::dotenv();

        fn parse_string(var: &str, default: String) -> String {
            env::var(var)
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        }

        // helper to parse seconds into Duration
        fn parse_secs(var: &str, default: Duration) -> Duration {
            env::var(var)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(default)
        }

        // helper to parse millis into Duration
        fn parse_millis(var: &str, default: Duration) -> Duration {
            env::var(var)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(default)
        }

        let defaults = Settings::default();
        Settings {
            base_url: parse_string("YTQUEUER_BASE_URL", defaults.base_url),
            poll_interval: parse_secs("YTQUEUER_POLL_INTERVAL_SECS", defaults.poll_interval),
            empty_queue_retry: parse_millis(
                "YTQUEUER_EMPTY_QUEUE_RETRY_MS",
                defaults.empty_queue_retry,
            ),
            error_retry: parse_secs("YTQUEUER_ERROR_RETRY_SECS", defaults.error_retry),
            request_timeout: parse_secs("YTQUEUER_REQUEST_TIMEOUT_SECS", defaults.request_timeout),
            session_file: env::var_os("YTQUEUER_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.session_file),
        }
    }
}

/// Global settings instance
pub static SETTINGS: Lazy<Settings> = Lazy::new(Settings::from_env);
