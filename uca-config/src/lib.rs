//! Configuration loading for `ucad` (SPEC_FULL.md §7.3): TOML file, then
//! environment variables, then CLI overrides.

pub mod loader;
pub mod types;

pub use loader::{apply_cli_overrides, apply_environment_overrides, load_config};
pub use types::{LoggingConfig, ServerConfig, UcaConfig};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("invalid TOML syntax: {0}")]
    ParseError(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
