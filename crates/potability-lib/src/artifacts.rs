//! Loading of the fitted scaler and classifier
//!
//! Both artifacts are read once at startup. Any failure is a
//! [`StartupError`]; a process that cannot load them must not accept
//! requests.

use crate::error::{ArtifactKind, StartupError};
use crate::predictor::{
    ClassifierArtifact, GbmClassifier, PotabilityPredictor, ScalerArtifact, StandardScaler,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Location and expected checksums of the fitted artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    pub scaler_path: PathBuf,
    pub classifier_path: PathBuf,
    /// Expected SHA-256 of the scaler file, hex encoded
    #[serde(default)]
    pub scaler_sha256: Option<String>,
    /// Expected SHA-256 of the classifier file, hex encoded
    #[serde(default)]
    pub classifier_sha256: Option<String>,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            scaler_path: PathBuf::from("artifacts/scaler.json"),
            classifier_path: PathBuf::from("artifacts/classifier.json"),
            scaler_sha256: None,
            classifier_sha256: None,
        }
    }
}

/// Provenance of a loaded artifact
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactInfo {
    pub path: PathBuf,
    pub checksum: String,
    pub size_bytes: usize,
}

/// Fitted artifacts, immutable once loaded
#[derive(Debug)]
pub struct Artifacts {
    pub scaler: StandardScaler,
    pub classifier: GbmClassifier,
    pub scaler_info: ArtifactInfo,
    pub classifier_info: ArtifactInfo,
}

impl Artifacts {
    /// Read, verify and validate both artifacts
    pub fn load(config: &ArtifactConfig) -> Result<Self, StartupError> {
        let (scaler, scaler_info) = read_artifact::<ScalerArtifact>(
            ArtifactKind::Scaler,
            &config.scaler_path,
            config.scaler_sha256.as_deref(),
        )?;
        let scaler = StandardScaler::from_artifact(scaler)?;

        let (classifier, classifier_info) = read_artifact::<ClassifierArtifact>(
            ArtifactKind::Classifier,
            &config.classifier_path,
            config.classifier_sha256.as_deref(),
        )?;
        let classifier = GbmClassifier::from_artifact(classifier)?;

        info!(
            trees = classifier.n_estimators(),
            learning_rate = classifier.learning_rate(),
            "Fitted artifacts loaded"
        );

        Ok(Self {
            scaler,
            classifier,
            scaler_info,
            classifier_info,
        })
    }

    /// Short model identifier derived from the classifier checksum
    pub fn model_version(&self) -> &str {
        let checksum = &self.classifier_info.checksum;
        &checksum[..checksum.len().min(12)]
    }

    /// Hand the artifacts to a predictor for the rest of the process
    pub fn into_predictor(self) -> PotabilityPredictor {
        PotabilityPredictor::new(Arc::new(self.scaler), Arc::new(self.classifier))
    }
}

fn read_artifact<T: DeserializeOwned>(
    kind: ArtifactKind,
    path: &Path,
    expected_checksum: Option<&str>,
) -> Result<(T, ArtifactInfo), StartupError> {
    let bytes = std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            StartupError::ArtifactMissing {
                kind,
                path: path.to_path_buf(),
            }
        } else {
            StartupError::ArtifactRead {
                kind,
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let checksum = compute_checksum(&bytes);
    match expected_checksum {
        Some(expected) if !expected.eq_ignore_ascii_case(&checksum) => {
            return Err(StartupError::ChecksumMismatch {
                kind,
                expected: expected.to_string(),
                actual: checksum,
            });
        }
        Some(_) => {}
        None => warn!(artifact = %kind, "No expected checksum configured, skipping verification"),
    }

    let artifact = serde_json::from_slice(&bytes).map_err(|source| StartupError::ArtifactParse {
        kind,
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        artifact = %kind,
        path = %path.display(),
        size = bytes.len(),
        checksum = %checksum,
        "Artifact read"
    );

    Ok((
        artifact,
        ArtifactInfo {
            path: path.to_path_buf(),
            checksum,
            size_bytes: bytes.len(),
        },
    ))
}

/// SHA-256 of a byte slice, hex encoded
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
