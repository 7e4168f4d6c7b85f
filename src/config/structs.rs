//! The configuration structs used to build the AppConfig, and their impls.
use std::path::Path;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use strum_macros::AsRefStr;

use crate::config::{ConfigError, ConfigResult, API_KEY_ENV};

// ###################################
// ->   STRUCTS
// ###################################
#[derive(AsRefStr, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AppConfig {
    pub net_config: NetConfig,
    pub provider_config: ProviderConfig,
    pub pipeline_config: PipelineConfig,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NetConfig {
    pub host: [u8; 4],
    pub app_port: u16,
}

/// Everything needed to talk to the mailing-list provider.
#[derive(Deserialize, Clone, Debug)]
pub struct ProviderConfig {
    pub base_url: String,
    /// `None` when the key is not configured or is blank.
    #[serde(default)]
    pub api_key: Option<SecretString>,
    pub group_id: String,
    pub automation_id: String,
    pub timeout_millis: u64,
}

/// The public URLs probed by the pipeline health check.
#[derive(Deserialize, Clone, Debug)]
pub struct PipelineConfig {
    pub landing_page_url: String,
    pub subscribe_url: String,
    pub timeout_millis: u64,
}

// ###################################
// ->   IMPLs
// ###################################
impl AppConfig {
    /// Layers `base.toml`, `{environment}.toml`, `APP_` prefixed env vars and finally
    /// the provider API key env var, later sources overriding earlier ones.
    pub fn load(config_dir: impl AsRef<Path>, environment: Environment) -> ConfigResult<Self> {
        let config_dir = config_dir.as_ref();
        let environment_filename = format!("{}.toml", environment.as_ref().to_lowercase());

        let mut config: AppConfig = Figment::new()
            .merge(Toml::file(config_dir.join("base.toml")))
            .merge(Toml::file(config_dir.join(environment_filename)))
            .merge(Env::prefixed("APP_").split("__"))
            .merge(
                Env::raw()
                    .only(&[API_KEY_ENV])
                    .map(|_| "provider_config.api_key".into()),
            )
            .extract()?;

        config.provider_config.api_key = config
            .provider_config
            .api_key
            .filter(|key| !key.expose_secret().trim().is_empty());

        Ok(config)
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_millis)
    }
}

impl PipelineConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_millis)
    }
}

/// Parses the base url with a guaranteed trailing slash so that relative joins keep the path.
pub(crate) fn parse_base_url(url: &str) -> ConfigResult<reqwest::Url> {
    let mut url = url.to_string();
    if !url.ends_with('/') {
        url.push('/');
    }
    reqwest::Url::parse(&url).map_err(|er| ConfigError::InvalidUrl {
        url,
        reason: er.to_string(),
    })
}

// ###################################
// ->   TRY FROMs
// ###################################

impl TryFrom<String> for Environment {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            _ => Err(Self::Error::StringToEnvironmentFail),
        }
    }
}

// ###################################
// ->   TESTS
// ###################################
