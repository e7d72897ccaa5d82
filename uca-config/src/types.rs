//! Configuration value types (spec.md §6.3, §6.5, SPEC_FULL.md §7.3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// TCP port the daemon listens on (spec.md §6.3, default 8989).
    pub port: u16,
    /// Host clients resolve `UCA_NET_HOST` to (client-side default).
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8989, host: "localhost".into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UcaConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}
