//! Server configuration

use anyhow::{Context, Result};
use potability_lib::ArtifactConfig;
use serde::Deserialize;
use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Port for the prediction, health and metrics API
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Path of the fitted scaler artifact
    #[serde(default = "default_scaler_path")]
    pub scaler_path: PathBuf,

    /// Path of the fitted classifier artifact
    #[serde(default = "default_classifier_path")]
    pub classifier_path: PathBuf,

    /// Expected SHA-256 of the scaler artifact
    #[serde(default)]
    pub scaler_sha256: Option<String>,

    /// Expected SHA-256 of the classifier artifact
    #[serde(default)]
    pub classifier_sha256: Option<String>,
}

fn default_api_port() -> u16 {
    8080
}

fn default_scaler_path() -> PathBuf {
    ArtifactConfig::default().scaler_path
}

fn default_classifier_path() -> PathBuf {
    ArtifactConfig::default().classifier_path
}

impl ServerConfig {
    /// Load configuration from `potability.toml` (optional) and
    /// `POTABILITY_*` environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("potability").required(false))
            .add_source(config::Environment::with_prefix("POTABILITY"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Invalid server configuration")
    }

    pub fn artifacts(&self) -> ArtifactConfig {
        ArtifactConfig {
            scaler_path: self.scaler_path.clone(),
            classifier_path: self.classifier_path.clone(),
            scaler_sha256: self.scaler_sha256.clone(),
            classifier_sha256: self.classifier_sha256.clone(),
        }
    }
}
