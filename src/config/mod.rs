//! Configuration management for the engine
//!
//! This module handles loading, validation, and management of engine configuration.

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use crate::utils::error::{AuthzError, Result};
use std::path::Path;
use tracing::info;

/// Main configuration struct for the engine
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Config {
    /// Engine configuration
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AuthzError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| AuthzError::Config(format!("Failed to parse config: {}", e)))?;

        config.engine.validate()?;

        Ok(config)
    }
}
