//! 3-tier configuration loading: TOML file < environment < CLI overrides,
//! grounded on the same precedence `feagi-config::loader` uses.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, ConfigResult, UcaConfig};

/// Loads `UcaConfig` starting from defaults, optionally merging a TOML
/// file, then environment variables, then explicit CLI overrides. Any
/// step beyond the defaults is optional: a missing `path` or empty
/// `cli_overrides` simply skips that tier.
pub fn load_config(
    path: Option<&Path>,
    cli_overrides: &HashMap<String, String>,
) -> ConfigResult<UcaConfig> {
    let mut config = match path {
        Some(p) => load_from_file(p)?,
        None => UcaConfig::default(),
    };
    apply_environment_overrides(&mut config);
    apply_cli_overrides(&mut config, cli_overrides);
    Ok(config)
}

fn load_from_file(path: &Path) -> ConfigResult<UcaConfig> {
    let text = fs::read_to_string(path).map_err(ConfigError::IoError)?;
    toml::from_str(&text).map_err(ConfigError::from)
}

/// `UCA_NET_PORT`, `UCA_NET_HOST`, `UCA_NET_LOG_LEVEL` (spec.md §6.3,
/// SPEC_FULL.md §7.3).
pub fn apply_environment_overrides(config: &mut UcaConfig) {
    if let Ok(value) = env::var("UCA_NET_PORT") {
        if let Ok(port) = value.parse::<u16>() {
            config.server.port = port;
        }
    }
    if let Ok(value) = env::var("UCA_NET_HOST") {
        config.server.host = value;
    }
    if let Ok(value) = env::var("UCA_NET_LOG_LEVEL") {
        config.logging.level = value;
    }
}

pub fn apply_cli_overrides(config: &mut UcaConfig, overrides: &HashMap<String, String>) {
    if let Some(value) = overrides.get("port") {
        if let Ok(port) = value.parse::<u16>() {
            config.server.port = port;
        }
    }
    if let Some(value) = overrides.get("host") {
        config.server.host = value.clone();
    }
    if let Some(value) = overrides.get("log_level") {
        config.logging.level = value.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_when_no_file_given() {
        let config = load_config(None, &HashMap::new()).unwrap();
        assert_eq!(config.server.port, 8989);
    }

    #[test]
    fn file_values_are_overridden_by_cli() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[server]\nport = 9000\nhost = \"example\"\n").unwrap();
        let mut overrides = HashMap::new();
        overrides.insert("port".to_string(), "9100".to_string());
        let config = load_config(Some(file.path()), &overrides).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "example");
    }

    #[test]
    fn missing_file_is_reported() {
        let result = load_config(Some(Path::new("/nonexistent/uca.toml")), &HashMap::new());
        assert!(result.is_err());
    }
}
