//! Feature derivation for ML inference
//!
//! Turns the nine raw measurements into the fifteen-position feature vector
//! the fitted scaler and classifier expect. The six derived features are
//! ratios and products of raw measurements.

use crate::models::{Feature, FeatureVector, RawMeasurement, NUM_FEATURES, NUM_RAW_FEATURES};

/// pH of neutral water, reference point for `ph_deviation`
pub const NEUTRAL_PH: f64 = 7.0;

/// Builds the ordered feature vector for one measurement
pub fn derive_features(m: &RawMeasurement) -> FeatureVector {
    let mut values = [0.0; NUM_FEATURES];
    values[..NUM_RAW_FEATURES].copy_from_slice(&m.values());

    let mut v = FeatureVector::new(values);
    v[Feature::TdsToConductivity] = guarded_ratio(m.solids, m.conductivity);
    v[Feature::OrganicToTurbidity] = guarded_ratio(m.organic_carbon, m.turbidity);
    v[Feature::HardnessToSolids] = guarded_ratio(m.hardness, m.solids);
    v[Feature::PhDeviation] = (m.ph - NEUTRAL_PH).abs();
    // Same formula as TdsToConductivity. The fitted artifacts expect both
    // columns, so the duplicate stays until the model is refit.
    v[Feature::TdsConcentration] = guarded_ratio(m.solids, m.conductivity);
    v[Feature::OrganicLoad] = m.organic_carbon * m.turbidity;
    v
}

/// `numerator / denominator`, or 0 when the denominator is exactly zero
fn guarded_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RawMeasurement {
        RawMeasurement {
            ph: 7.0,
            hardness: 196.0,
            solids: 22000.0,
            chloramines: 7.12,
            sulfate: 333.0,
            conductivity: 426.0,
            organic_carbon: 14.3,
            trihalomethanes: 66.0,
            turbidity: 3.97,
        }
    }

    #[test]
    fn test_raw_positions_unchanged() {
        let m = RawMeasurement {
            ph: 3.3,
            solids: 1234.5,
            turbidity: 6.1,
            ..sample()
        };
        let v = derive_features(&m);
        assert_eq!(v.as_array().len(), NUM_FEATURES);
        assert_eq!(&v.as_array()[..NUM_RAW_FEATURES], &m.values()[..]);
    }

    #[test]
    fn test_reference_sample_derivations() {
        let v = derive_features(&sample());
        assert_eq!(v[Feature::PhDeviation], 0.0);
        assert!((v[Feature::OrganicLoad] - 56.771).abs() < 1e-9);
        assert_eq!(v[Feature::TdsToConductivity], 22000.0 / 426.0);
        assert_eq!(v[Feature::TdsConcentration], v[Feature::TdsToConductivity]);
        assert!((v[Feature::TdsToConductivity] - 51.643).abs() < 1e-3);
        assert!((v[Feature::OrganicToTurbidity] - 14.3 / 3.97).abs() < 1e-12);
        assert!((v[Feature::HardnessToSolids] - 196.0 / 22000.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_conductivity_guard() {
        let v = derive_features(&RawMeasurement {
            conductivity: 0.0,
            ..sample()
        });
        assert_eq!(v[Feature::TdsToConductivity], 0.0);
        assert_eq!(v[Feature::TdsConcentration], 0.0);
        assert!(v.first_non_finite().is_none());
    }

    #[test]
    fn test_zero_turbidity_guard() {
        let v = derive_features(&RawMeasurement {
            turbidity: 0.0,
            ..sample()
        });
        assert_eq!(v[Feature::OrganicToTurbidity], 0.0);
        assert_eq!(v[Feature::OrganicLoad], 0.0);
    }

    #[test]
    fn test_zero_solids_guard() {
        let v = derive_features(&RawMeasurement {
            solids: 0.0,
            ..sample()
        });
        assert_eq!(v[Feature::HardnessToSolids], 0.0);
        assert_eq!(v[Feature::TdsToConductivity], 0.0);
    }

    #[test]
    fn test_tds_features_always_equal() {
        for conductivity in [0.0, 1e-9, 180.0, 426.0, 750.0, -3.0] {
            let v = derive_features(&RawMeasurement {
                conductivity,
                ..sample()
            });
            assert_eq!(v[Feature::TdsToConductivity], v[Feature::TdsConcentration]);
        }
    }

    #[test]
    fn test_ph_deviation_non_negative() {
        for ph in [0.0, 2.5, 6.99, 7.0, 7.01, 9.0, 14.0] {
            let v = derive_features(&RawMeasurement { ph, ..sample() });
            assert!(v[Feature::PhDeviation] >= 0.0);
            assert_eq!(v[Feature::PhDeviation] == 0.0, ph == 7.0);
        }
    }
}
