use std::time::Duration;

use eduscope_core::dashboard::ComposerConfig;
use eduscope_core::retry::RetryPolicy;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long background tasks get to stop after shutdown begins (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT token configuration.
    pub jwt: JwtConfig,
    /// Dashboard loading behaviour.
    pub dashboard: DashboardConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt: JwtConfig::from_env(),
            dashboard: DashboardConfig::from_env(),
        }
    }
}

/// Dashboard load settings.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Upper bound on one dashboard or widget load.
    pub load_timeout_secs: u64,
    /// Cap on how long a cached section summary is reused.
    pub cache_max_ttl_secs: u64,
    /// Attempts per fetch, including the first.
    pub fetch_attempts: u32,
    /// Default window for activity, active users and alerts.
    pub activity_window_hours: i64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            load_timeout_secs: 15,
            cache_max_ttl_secs: 600,
            fetch_attempts: 2,
            activity_window_hours: 24,
        }
    }
}

impl DashboardConfig {
    /// | Env Var                           | Default |
    /// |-----------------------------------|---------|
    /// | `DASHBOARD_LOAD_TIMEOUT_SECS`     | `15`    |
    /// | `DASHBOARD_CACHE_MAX_TTL_SECS`    | `600`   |
    /// | `DASHBOARD_FETCH_ATTEMPTS`        | `2`     |
    /// | `DASHBOARD_ACTIVITY_WINDOW_HOURS` | `24`    |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let load_timeout_secs: u64 = std::env::var("DASHBOARD_LOAD_TIMEOUT_SECS")
            .map(|v| v.parse().expect("DASHBOARD_LOAD_TIMEOUT_SECS must be a valid u64"))
            .unwrap_or(defaults.load_timeout_secs);

        let cache_max_ttl_secs: u64 = std::env::var("DASHBOARD_CACHE_MAX_TTL_SECS")
            .map(|v| v.parse().expect("DASHBOARD_CACHE_MAX_TTL_SECS must be a valid u64"))
            .unwrap_or(defaults.cache_max_ttl_secs);

        let fetch_attempts: u32 = std::env::var("DASHBOARD_FETCH_ATTEMPTS")
            .map(|v| v.parse().expect("DASHBOARD_FETCH_ATTEMPTS must be a valid u32"))
            .unwrap_or(defaults.fetch_attempts);

        let activity_window_hours: i64 = std::env::var("DASHBOARD_ACTIVITY_WINDOW_HOURS")
            .map(|v| v.parse().expect("DASHBOARD_ACTIVITY_WINDOW_HOURS must be a valid i64"))
            .unwrap_or(defaults.activity_window_hours);

        Self {
            load_timeout_secs,
            cache_max_ttl_secs,
            fetch_attempts,
            activity_window_hours,
        }
    }

    pub fn composer_config(&self) -> ComposerConfig {
        ComposerConfig {
            load_timeout: Duration::from_secs(self.load_timeout_secs),
            retry: RetryPolicy {
                attempts: self.fetch_attempts,
                ..RetryPolicy::default()
            },
            activity_window_hours: self.activity_window_hours,
            cache_max_ttl: Duration::from_secs(self.cache_max_ttl_secs),
            ..ComposerConfig::default()
        }
    }
}
