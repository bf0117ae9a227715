//! Server configuration

use agrisage_lib::store::DEFAULT_MAX_ARTIFACT_BYTES;
use agrisage_lib::ColumnOrder;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable naming the config file
pub const CONFIG_PATH_VAR: &str = "AGRISAGE_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "agrisage.toml";

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP port for prediction, health and metrics endpoints
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding one ONNX artifact per task
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Column order for artifacts without recorded feature names
    #[serde(default)]
    pub column_order: ColumnOrder,

    /// Load every artifact at startup instead of on first use
    #[serde(default)]
    pub warm_up: bool,

    /// Artifacts larger than this are treated as unavailable
    #[serde(default = "default_max_artifact_bytes")]
    pub max_artifact_bytes: u64,
}

fn default_port() -> u16 {
    5000
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_max_artifact_bytes() -> u64 {
    DEFAULT_MAX_ARTIFACT_BYTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            model_dir: default_model_dir(),
            column_order: ColumnOrder::default(),
            warm_up: false,
            max_artifact_bytes: default_max_artifact_bytes(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from an optional config file, then `AGRISAGE_*` env vars
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&path)
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("AGRISAGE").try_parsing(true))
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid configuration")
    }
}
