//! Configuration loader for SynthOS.
//!
//! Reads the TOML file named on the command line into [`SynthosConfig`].
//! Unlike optional sections, which fall back to defaults, a missing or
//! malformed file is an error: the controller credential has no default.

use std::path::{Path, PathBuf};

use thiserror::Error;

use synthos_types::config::SynthosConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Load configuration from `path`.
pub async fn load_config(path: &Path) -> Result<SynthosConfig, ConfigError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let config = toml::from_str::<SynthosConfig>(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}
