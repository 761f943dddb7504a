//! Water potability prediction library
//!
//! This crate provides the core functionality for:
//! - Deriving the fixed fifteen-feature vector from nine water measurements
//! - Scaling and classifying it with fitted artifacts loaded at startup
//! - Assembling the verdict, importance chart and safe-range reference table
//! - Health checks and observability for the serving process

pub mod artifacts;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;

pub use artifacts::{ArtifactConfig, Artifacts};
pub use error::{ArtifactKind, InferenceError, StartupError};
pub use health::{ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse};
pub use models::*;
pub use observability::{PredictorMetrics, StructuredLogger};
pub use predictor::{Classifier, PotabilityPredictor, PredictionReport, Scaler};
