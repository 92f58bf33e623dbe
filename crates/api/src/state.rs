use std::sync::Arc;

use eduscope_core::dashboard::DashboardComposer;
use eduscope_core::source::AnalyticsSource;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Analytics data source (Postgres in production, in-memory in tests).
    pub source: Arc<dyn AnalyticsSource>,
    /// Dashboard composer; owns the refresh tracker and summary cache.
    pub composer: Arc<DashboardComposer>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Build state around a data source, creating the composer from config.
    pub fn new(source: Arc<dyn AnalyticsSource>, config: ServerConfig) -> Self {
        let composer = DashboardComposer::new(Arc::clone(&source), config.dashboard.composer_config());
        Self {
            source,
            composer: Arc::new(composer),
            config: Arc::new(config),
        }
    }
}
