//! Potability prediction engine

mod features;
mod inference;
mod output;
mod pipeline;
mod scaler;

pub use features::{derive_features, NEUTRAL_PH};
pub use inference::{ClassifierArtifact, GbmClassifier, GbmTree, TreeArtifact};
pub use output::{
    importance_table, reference_table, ImportanceEntry, PredictionReport, ReferenceRow,
};
pub use pipeline::{PotabilityPredictor, PROBABILITY_TOLERANCE};
pub use scaler::{ScalerArtifact, StandardScaler};

use crate::error::InferenceError;
use crate::models::{ClassProbabilities, FeatureImportances, FeatureVector, Label};

/// Fitted feature transform applied before inference
pub trait Scaler: Send + Sync {
    /// Transform every position independently
    fn transform(&self, features: &FeatureVector) -> Result<FeatureVector, InferenceError>;
}

/// Fitted binary classifier
pub trait Classifier: Send + Sync {
    /// Predicted label for a scaled feature vector
    fn predict(&self, features: &FeatureVector) -> Result<Label, InferenceError>;

    /// Per-class probabilities for a scaled feature vector
    fn predict_probability(
        &self,
        features: &FeatureVector,
    ) -> Result<ClassProbabilities, InferenceError>;

    /// Static importance weights of the fitted model
    fn feature_importances(&self) -> &FeatureImportances;
}
