pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to build the 'Enviroment' from the provided string.")]
    StringToEnvironmentFail,
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("figment error: {0}")]
    Figment(#[from] figment::Error),
}
