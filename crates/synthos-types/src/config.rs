//! Configuration schema for SynthOS.
//!
//! `SynthosConfig` mirrors the static `synthos.toml` read once at startup.
//! Only the controller credential is mandatory; every other field has a
//! default.

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Deserialize)]
pub struct SynthosConfig {
    pub synthos: SynthosSection,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub lifecycle: LifecycleConfig,
}

#[derive(Debug, Deserialize)]
pub struct SynthosSection {
    /// Operator identity; included in alerts raised on handler failures.
    #[serde(default)]
    pub admin_id: Option<String>,

    /// Default tracing directive (e.g. "info", "synthos_core=debug").
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit one JSON object per log line instead of human-readable text.
    #[serde(default)]
    pub log_json: bool,

    /// Bridge spans to OpenTelemetry with a stdout exporter.
    #[serde(default)]
    pub otel_stdout: bool,

    pub controller: ControllerConfig,
}

#[derive(Debug, Deserialize)]
pub struct ControllerConfig {
    pub token: SecretString,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

/// Relay tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// A reply starting with this edits the referenced message instead.
    #[serde(default = "default_edit_prefix")]
    pub edit_prefix: String,

    /// Appended to every relayed new message.
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            edit_prefix: default_edit_prefix(),
            suffix: default_suffix(),
        }
    }
}

/// Timeouts bounding session open/close calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    #[serde(default = "default_open_timeout_secs")]
    pub open_timeout_secs: u64,

    #[serde(default = "default_close_timeout_secs")]
    pub close_timeout_secs: u64,
}

impl LifecycleConfig {
    pub fn open_timeout(&self) -> Duration {
        Duration::from_secs(self.open_timeout_secs)
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_secs(self.close_timeout_secs)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            open_timeout_secs: default_open_timeout_secs(),
            close_timeout_secs: default_close_timeout_secs(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_database_url() -> String {
    "sqlite://synthos.db?mode=rwc".to_string()
}

fn default_edit_prefix() -> String {
    "s;edit ".to_string()
}

fn default_suffix() -> String {
    " beep".to_string()
}

fn default_open_timeout_secs() -> u64 {
    30
}

fn default_close_timeout_secs() -> u64 {
    10
}
