//! Prediction report assembly
//!
//! Pairs the classifier's importances with feature labels and joins the
//! static safe-range table with the submitted measurement.

use crate::models::{
    ClassProbabilities, Feature, FeatureImportances, FeatureVector, PredictionResult,
    RawMeasurement,
};
use serde::{Deserialize, Serialize};

/// One bar of the feature importance chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportanceEntry {
    pub feature: Feature,
    pub label: String,
    pub importance: f64,
}

/// One row of the parameter reference table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRow {
    pub parameter: String,
    /// `None` when the table is rendered without a sample
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,
    pub safe_range: String,
}

/// Everything shown for one successful prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionReport {
    pub result: PredictionResult,
    pub confidence_percent: f64,
    pub probabilities: ClassProbabilities,
    pub feature_importance: Vec<ImportanceEntry>,
    pub reference: Vec<ReferenceRow>,
    pub features: FeatureVector,
    pub generated_at: i64,
}

/// Importances sorted descending; equal weights keep feature order
pub fn importance_table(importances: &FeatureImportances) -> Vec<ImportanceEntry> {
    let mut entries: Vec<ImportanceEntry> = importances
        .iter()
        .map(|(feature, importance)| ImportanceEntry {
            feature,
            label: feature.label().to_string(),
            importance,
        })
        .collect();
    // sort_by is stable
    entries.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    entries
}

/// Safe ranges of the raw parameters, joined with a sample when given
pub fn reference_table(sample: Option<&RawMeasurement>) -> Vec<ReferenceRow> {
    Feature::RAW
        .iter()
        .map(|&feature| ReferenceRow {
            parameter: feature.label().to_string(),
            current_value: sample.and_then(|s| s.get(feature)),
            safe_range: feature.safe_range().unwrap_or_default().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NUM_FEATURES;

    fn importances() -> FeatureImportances {
        FeatureImportances::new([
            0.12, 0.08, 0.10, 0.07, 0.14, 0.05, 0.06, 0.05, 0.04, 0.06, 0.05, 0.04, 0.06, 0.03,
            0.05,
        ])
        .unwrap()
    }

    #[test]
    fn test_importance_table_sorted_descending() {
        let table = importance_table(&importances());
        assert_eq!(table.len(), NUM_FEATURES);
        assert!(table.windows(2).all(|w| w[0].importance >= w[1].importance));
        assert_eq!(table[0].label, "Sulfate");
        assert_eq!(table[1].label, "pH");
        let sum: f64 = table.iter().map(|e| e.importance).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_importance_ties_keep_feature_order() {
        let table = importance_table(&importances());
        let tied: Vec<Feature> = table
            .iter()
            .filter(|e| e.importance == 0.05)
            .map(|e| e.feature)
            .collect();
        assert_eq!(
            tied,
            vec![
                Feature::Conductivity,
                Feature::Trihalomethanes,
                Feature::OrganicToTurbidity,
                Feature::OrganicLoad,
            ]
        );
    }

    #[test]
    fn test_reference_table_with_sample() {
        let sample = RawMeasurement::default();
        let rows = reference_table(Some(&sample));
        assert_eq!(rows.len(), 9);
        assert_eq!(rows[0].parameter, "pH");
        assert_eq!(rows[0].current_value, Some(7.0));
        assert_eq!(rows[0].safe_range, "6.5–8.5");
        assert_eq!(rows[5].safe_range, "180–400 μS/cm");
        assert_eq!(rows[8].parameter, "Turbidity");
        assert_eq!(rows[8].current_value, Some(3.97));
        assert_eq!(rows[8].safe_range, "0–5 NTU");
    }

    #[test]
    fn test_reference_table_without_sample() {
        let rows = reference_table(None);
        assert!(rows.iter().all(|r| r.current_value.is_none()));
        assert_eq!(rows[6].parameter, "Organic Carbon");
        assert_eq!(rows[6].safe_range, "0–2 ppm");
    }
}
