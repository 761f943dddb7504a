//! Configuration management for the CLI

use anyhow::{Context, Result};
use potability_lib::ArtifactConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration, read from `~/.config/potability/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Default scaler artifact path
    pub scaler_path: Option<PathBuf>,
    /// Default classifier artifact path
    pub classifier_path: Option<PathBuf>,
    /// Expected SHA-256 of the scaler artifact
    pub scaler_sha256: Option<String>,
    /// Expected SHA-256 of the classifier artifact
    pub classifier_sha256: Option<String>,
}

impl Config {
    /// Load configuration from the user config file, if any
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("potability").join("config.json"))
    }

    /// Artifact locations: command line first, then this file, then the
    /// built-in defaults
    pub fn artifacts(
        &self,
        scaler: Option<PathBuf>,
        classifier: Option<PathBuf>,
    ) -> ArtifactConfig {
        let defaults = ArtifactConfig::default();
        ArtifactConfig {
            scaler_path: scaler
                .or_else(|| self.scaler_path.clone())
                .unwrap_or(defaults.scaler_path),
            classifier_path: classifier
                .or_else(|| self.classifier_path.clone())
                .unwrap_or(defaults.classifier_path),
            scaler_sha256: self.scaler_sha256.clone(),
            classifier_sha256: self.classifier_sha256.clone(),
        }
    }
}
