//! Derivation, scaling and inference for one request

use super::features::derive_features;
use super::output::{importance_table, reference_table, PredictionReport};
use super::{Classifier, Scaler};
use crate::error::InferenceError;
use crate::models::{Label, PredictionResult, RawMeasurement};
use std::sync::Arc;
use tracing::{debug, warn};

/// Accepted deviation of `p(not potable) + p(potable)` from 1.0
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Runs the fitted scaler and classifier over raw measurements.
///
/// Holds no per-request state; clones share the same fitted artifacts.
#[derive(Clone)]
pub struct PotabilityPredictor {
    scaler: Arc<dyn Scaler>,
    classifier: Arc<dyn Classifier>,
}

impl PotabilityPredictor {
    pub fn new(scaler: Arc<dyn Scaler>, classifier: Arc<dyn Classifier>) -> Self {
        Self { scaler, classifier }
    }

    /// Full report for one measurement. Either every part is produced or
    /// an error is returned.
    pub fn predict(&self, measurement: &RawMeasurement) -> Result<PredictionReport, InferenceError> {
        let out_of_domain = measurement.out_of_domain();
        if !out_of_domain.is_empty() {
            warn!(features = ?out_of_domain, "Measurement outside documented input domain");
        }

        let features = derive_features(measurement);
        if let Some(feature) = features.first_non_finite() {
            return Err(InferenceError::NonFiniteFeature { feature });
        }

        let scaled = self.scaler.transform(&features)?;
        let label = self.classifier.predict(&scaled)?;
        let probabilities = self.classifier.predict_probability(&scaled)?;

        let (p0, p1) = (probabilities.not_potable, probabilities.potable);
        if !p0.is_finite() || !p1.is_finite() || (p0 + p1 - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(InferenceError::InconsistentProbabilities {
                not_potable: p0,
                potable: p1,
            });
        }

        let confidence = match label {
            Label::Potable => p1,
            Label::NotPotable => p0,
        };
        let result = PredictionResult { label, confidence };
        debug!(label = %label, confidence, "Prediction completed");

        Ok(PredictionReport {
            result,
            confidence_percent: result.confidence_percent(),
            probabilities,
            feature_importance: importance_table(self.classifier.feature_importances()),
            reference: reference_table(Some(measurement)),
            features,
            generated_at: chrono::Utc::now().timestamp(),
        })
    }
}
