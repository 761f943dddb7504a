//! Error types for the potability predictor
//!
//! Startup failures and per-request failures are separate types: a
//! [`StartupError`] means no request may be served, an [`InferenceError`]
//! only fails the request that produced it.

use crate::models::Feature;
use std::path::PathBuf;
use thiserror::Error;

/// Which fitted artifact an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Scaler,
    Classifier,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::Scaler => f.write_str("scaler"),
            ArtifactKind::Classifier => f.write_str("classifier"),
        }
    }
}

/// Fatal configuration error raised while loading fitted artifacts
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("{kind} artifact not found at {path:?}")]
    ArtifactMissing { kind: ArtifactKind, path: PathBuf },

    #[error("failed to read {kind} artifact {path:?}: {source}")]
    ArtifactRead {
        kind: ArtifactKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {kind} artifact {path:?}: {source}")]
    ArtifactParse {
        kind: ArtifactKind,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} artifact checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        kind: ArtifactKind,
        expected: String,
        actual: String,
    },

    #[error("invalid {kind} artifact: {reason}")]
    InvalidArtifact { kind: ArtifactKind, reason: String },
}

impl StartupError {
    pub fn invalid(kind: ArtifactKind, reason: impl Into<String>) -> Self {
        StartupError::InvalidArtifact {
            kind,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        match self {
            StartupError::ArtifactMissing { kind, .. }
            | StartupError::ArtifactRead { kind, .. }
            | StartupError::ArtifactParse { kind, .. }
            | StartupError::ChecksumMismatch { kind, .. }
            | StartupError::InvalidArtifact { kind, .. } => *kind,
        }
    }
}

/// Non-fatal failure of a single prediction request
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("feature {feature} is not a finite number")]
    NonFiniteFeature { feature: Feature },

    #[error("scaled feature {feature} is not a finite number")]
    NonFiniteScaled { feature: Feature },

    #[error("scaler failed: {0}")]
    Scaler(String),

    #[error("classifier failed: {0}")]
    Classifier(String),

    #[error("class probabilities are inconsistent: not_potable={not_potable}, potable={potable}")]
    InconsistentProbabilities { not_potable: f64, potable: f64 },
}
