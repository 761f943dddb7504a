//! Standardization of feature vectors
//!
//! Mirrors a fitted `StandardScaler`: every position is shifted by its
//! training mean and divided by its training standard deviation.

use super::Scaler;
use crate::error::{ArtifactKind, InferenceError, StartupError};
use crate::models::{Feature, FeatureVector, NUM_FEATURES};
use serde::{Deserialize, Serialize};

/// On-disk form of a fitted standard scaler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerArtifact {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Per-position affine scaler fitted offline
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: [f64; NUM_FEATURES],
    scale: [f64; NUM_FEATURES],
}

impl StandardScaler {
    /// Build from fitted parameters. Every scale must be finite and
    /// strictly positive.
    pub fn new(mean: [f64; NUM_FEATURES], scale: [f64; NUM_FEATURES]) -> Result<Self, StartupError> {
        for feature in Feature::ALL {
            let (m, s) = (mean[feature.index()], scale[feature.index()]);
            if !m.is_finite() {
                return Err(StartupError::invalid(
                    ArtifactKind::Scaler,
                    format!("mean of {} is not finite", feature),
                ));
            }
            if !s.is_finite() || s <= 0.0 {
                return Err(StartupError::invalid(
                    ArtifactKind::Scaler,
                    format!("scale of {} must be positive, got {}", feature, s),
                ));
            }
        }
        Ok(Self { mean, scale })
    }

    pub fn from_artifact(artifact: ScalerArtifact) -> Result<Self, StartupError> {
        let mean = to_array(artifact.mean, "mean")?;
        let scale = to_array(artifact.scale, "scale")?;
        Self::new(mean, scale)
    }

    /// Scaler that leaves every value unchanged
    pub fn identity() -> Self {
        Self {
            mean: [0.0; NUM_FEATURES],
            scale: [1.0; NUM_FEATURES],
        }
    }
}

fn to_array(values: Vec<f64>, field: &str) -> Result<[f64; NUM_FEATURES], StartupError> {
    let len = values.len();
    values.try_into().map_err(|_| {
        StartupError::invalid(
            ArtifactKind::Scaler,
            format!("{} has {} values, expected {}", field, len, NUM_FEATURES),
        )
    })
}

impl Scaler for StandardScaler {
    fn transform(&self, features: &FeatureVector) -> Result<FeatureVector, InferenceError> {
        let mut out = *features;
        for feature in Feature::ALL {
            let i = feature.index();
            let scaled = (features[feature] - self.mean[i]) / self.scale[i];
            if !scaled.is_finite() {
                return Err(InferenceError::NonFiniteScaled { feature });
            }
            out[feature] = scaled;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standardization() {
        let mut mean = [0.0; NUM_FEATURES];
        let mut scale = [1.0; NUM_FEATURES];
        mean[Feature::Ph.index()] = 7.0;
        scale[Feature::Ph.index()] = 2.0;
        mean[Feature::Solids.index()] = 22000.0;
        scale[Feature::Solids.index()] = 8000.0;
        let scaler = StandardScaler::new(mean, scale).unwrap();

        let mut v = FeatureVector::new([3.0; NUM_FEATURES]);
        v[Feature::Ph] = 9.0;
        v[Feature::Solids] = 14000.0;

        let scaled = scaler.transform(&v).unwrap();
        assert_eq!(scaled[Feature::Ph], 1.0);
        assert_eq!(scaled[Feature::Solids], -1.0);
        assert_eq!(scaled[Feature::Sulfate], 3.0);
    }

    #[test]
    fn test_identity_scaler() {
        let v = FeatureVector::new([42.0; NUM_FEATURES]);
        assert_eq!(StandardScaler::identity().transform(&v).unwrap(), v);
    }

    #[test]
    fn test_rejects_zero_scale() {
        let mut scale = [1.0; NUM_FEATURES];
        scale[Feature::OrganicLoad.index()] = 0.0;
        let err = StandardScaler::new([0.0; NUM_FEATURES], scale).unwrap_err();
        assert!(err.to_string().contains("organic_load"));
    }

    #[test]
    fn test_rejects_wrong_length() {
        let artifact = ScalerArtifact {
            mean: vec![0.0; 14],
            scale: vec![1.0; NUM_FEATURES],
        };
        let err = StandardScaler::from_artifact(artifact).unwrap_err();
        assert!(err.to_string().contains("mean has 14 values"));
    }

    #[test]
    fn test_non_finite_output_is_request_error() {
        let v = FeatureVector::new([f64::INFINITY; NUM_FEATURES]);
        let err = StandardScaler::identity().transform(&v).unwrap_err();
        assert!(matches!(err, InferenceError::NonFiniteScaled { feature: Feature::Ph }));
    }
}
