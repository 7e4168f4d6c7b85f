//! Tries to create an `AppConfig` from config files and the environment.
//! Layers `base.toml`, the environment specific file and environment variables with `figment`.
//! Gets initialized with `OnceLock` so it only needs to get initialized once.

mod error;
mod structs;

use std::sync::OnceLock;
use tracing::info;

// Re-export config structs
pub use error::{ConfigError, ConfigResult};
pub use structs::{AppConfig, Environment, NetConfig, PipelineConfig, ProviderConfig};
pub(crate) use structs::parse_base_url;

/// Name of the environment variable holding the mailing-list provider API key.
pub const API_KEY_ENV: &str = "MAILERLITE_API_KEY";

/// Allocates a static `OnceLock` containing `AppConfig`.
/// This ensures configuration only gets initialized the first time we call this function.
/// Every other caller gets a &'static ref to AppConfig.
/// Panics if anything goes wrong.
pub fn get_or_init_config() -> &'static AppConfig {
    static CONFIG_INIT: OnceLock<AppConfig> = OnceLock::new();
    CONFIG_INIT.get_or_init(|| {
        info!(
            "{:<12} - Initializing the configuration",
            "get_or_init_config"
        );
        let base_path = std::env::current_dir().expect("Failed to determine the current DIR.");
        let config_dir = base_path.join("config");

        let environment: Environment = std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()
            .expect("Failed to parse APP_ENVIRONMENT.");

        AppConfig::load(config_dir, environment)
            .unwrap_or_else(|er| panic!("Fatal Error: Building config: {er}"))
    })
}
