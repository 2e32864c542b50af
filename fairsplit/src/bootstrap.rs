use std::env;

use tracing_subscriber::EnvFilter;

/// Environment-derived configuration for the CLI host.
pub struct AppConfig {
    /// Snapshot path used when no CLI argument is given.
    pub snapshot_path: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let snapshot_path = env::var("FAIRSPLIT_SNAPSHOT").ok();
        Self { snapshot_path }
    }
}

/// Initialize logging and tracing. `RUST_LOG` controls the level.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
