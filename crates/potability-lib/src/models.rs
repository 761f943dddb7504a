//! Core data models for the potability predictor

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut, RangeInclusive};

/// Number of positions in a [`FeatureVector`]
pub const NUM_FEATURES: usize = 15;

/// Number of user-supplied measurements at the head of a [`FeatureVector`]
pub const NUM_RAW_FEATURES: usize = 9;

/// Water sample measurements supplied per request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawMeasurement {
    pub ph: f64,
    /// mg/L
    pub hardness: f64,
    /// Total dissolved solids, mg/L
    pub solids: f64,
    /// ppm
    pub chloramines: f64,
    /// mg/L
    pub sulfate: f64,
    /// μS/cm
    pub conductivity: f64,
    /// ppm
    pub organic_carbon: f64,
    /// μg/L
    pub trihalomethanes: f64,
    /// NTU
    pub turbidity: f64,
}

impl Default for RawMeasurement {
    fn default() -> Self {
        Self {
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
}

impl RawMeasurement {
    /// Value of a raw feature; `None` for derived features
    pub fn get(&self, feature: Feature) -> Option<f64> {
        let value = match feature {
            Feature::Ph => self.ph,
            Feature::Hardness => self.hardness,
            Feature::Solids => self.solids,
            Feature::Chloramines => self.chloramines,
            Feature::Sulfate => self.sulfate,
            Feature::Conductivity => self.conductivity,
            Feature::OrganicCarbon => self.organic_carbon,
            Feature::Trihalomethanes => self.trihalomethanes,
            Feature::Turbidity => self.turbidity,
            _ => return None,
        };
        Some(value)
    }

    /// Raw values in feature order
    pub fn values(&self) -> [f64; NUM_RAW_FEATURES] {
        [
            self.ph,
            self.hardness,
            self.solids,
            self.chloramines,
            self.sulfate,
            self.conductivity,
            self.organic_carbon,
            self.trihalomethanes,
            self.turbidity,
        ]
    }

    /// Raw fields whose value lies outside the documented input domain.
    ///
    /// Out-of-domain values are still accepted by the predictor.
    pub fn out_of_domain(&self) -> Vec<Feature> {
        Feature::RAW
            .iter()
            .copied()
            .filter(|f| match (f.input_domain(), self.get(*f)) {
                (Some(domain), Some(value)) => !domain.contains(&value),
                _ => false,
            })
            .collect()
    }
}

/// Position of every value in a [`FeatureVector`].
///
/// The fitted scaler and classifier were trained against this exact order;
/// variants must never be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Ph,
    Hardness,
    Solids,
    Chloramines,
    Sulfate,
    Conductivity,
    OrganicCarbon,
    Trihalomethanes,
    Turbidity,
    TdsToConductivity,
    OrganicToTurbidity,
    HardnessToSolids,
    PhDeviation,
    TdsConcentration,
    OrganicLoad,
}

impl Feature {
    pub const ALL: [Feature; NUM_FEATURES] = [
        Feature::Ph,
        Feature::Hardness,
        Feature::Solids,
        Feature::Chloramines,
        Feature::Sulfate,
        Feature::Conductivity,
        Feature::OrganicCarbon,
        Feature::Trihalomethanes,
        Feature::Turbidity,
        Feature::TdsToConductivity,
        Feature::OrganicToTurbidity,
        Feature::HardnessToSolids,
        Feature::PhDeviation,
        Feature::TdsConcentration,
        Feature::OrganicLoad,
    ];

    pub const RAW: [Feature; NUM_RAW_FEATURES] = [
        Feature::Ph,
        Feature::Hardness,
        Feature::Solids,
        Feature::Chloramines,
        Feature::Sulfate,
        Feature::Conductivity,
        Feature::OrganicCarbon,
        Feature::Trihalomethanes,
        Feature::Turbidity,
    ];

    /// Position in the feature vector
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_raw(self) -> bool {
        self.index() < NUM_RAW_FEATURES
    }

    /// Machine-readable key
    pub fn key(self) -> &'static str {
        match self {
            Feature::Ph => "ph",
            Feature::Hardness => "hardness",
            Feature::Solids => "solids",
            Feature::Chloramines => "chloramines",
            Feature::Sulfate => "sulfate",
            Feature::Conductivity => "conductivity",
            Feature::OrganicCarbon => "organic_carbon",
            Feature::Trihalomethanes => "trihalomethanes",
            Feature::Turbidity => "turbidity",
            Feature::TdsToConductivity => "tds_to_conductivity",
            Feature::OrganicToTurbidity => "organic_to_turbidity",
            Feature::HardnessToSolids => "hardness_to_solids",
            Feature::PhDeviation => "ph_deviation",
            Feature::TdsConcentration => "tds_concentration",
            Feature::OrganicLoad => "organic_load",
        }
    }

    /// Display name used in importance charts and the reference table
    pub fn label(self) -> &'static str {
        match self {
            Feature::Ph => "pH",
            Feature::Hardness => "Hardness",
            Feature::Solids => "Solids",
            Feature::Chloramines => "Chloramines",
            Feature::Sulfate => "Sulfate",
            Feature::Conductivity => "Conductivity",
            Feature::OrganicCarbon => "Organic Carbon",
            Feature::Trihalomethanes => "Trihalomethanes",
            Feature::Turbidity => "Turbidity",
            Feature::TdsToConductivity => "TDS/Conductivity",
            Feature::OrganicToTurbidity => "Organic/Turbidity",
            Feature::HardnessToSolids => "Hardness/Solids",
            Feature::PhDeviation => "pH Deviation",
            Feature::TdsConcentration => "TDS Concentration",
            Feature::OrganicLoad => "Organic Load",
        }
    }

    /// Documented input domain of a raw measurement
    pub fn input_domain(self) -> Option<RangeInclusive<f64>> {
        let domain = match self {
            Feature::Ph => 0.0..=14.0,
            Feature::Hardness => 47.0..=323.0,
            Feature::Solids => 500.0..=50000.0,
            Feature::Chloramines => 0.35..=13.13,
            Feature::Sulfate => 129.0..=481.0,
            Feature::Conductivity => 180.0..=750.0,
            Feature::OrganicCarbon => 2.2..=28.3,
            Feature::Trihalomethanes => 0.7..=124.0,
            Feature::Turbidity => 1.45..=6.74,
            _ => return None,
        };
        Some(domain)
    }

    /// Static drinking-water safe range, independent of the model
    pub fn safe_range(self) -> Option<&'static str> {
        let range = match self {
            Feature::Ph => "6.5–8.5",
            Feature::Hardness => "47–323 mg/L",
            Feature::Solids => "500–1000 mg/L",
            Feature::Chloramines => "0.35–4 ppm",
            Feature::Sulfate => "3–250 mg/L",
            Feature::Conductivity => "180–400 μS/cm",
            Feature::OrganicCarbon => "0–2 ppm",
            Feature::Trihalomethanes => "0–80 μg/L",
            Feature::Turbidity => "0–5 NTU",
            _ => return None,
        };
        Some(range)
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Fixed-length, position-significant model input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector([f64; NUM_FEATURES]);

impl FeatureVector {
    pub fn new(values: [f64; NUM_FEATURES]) -> Self {
        Self(values)
    }

    pub fn as_array(&self) -> &[f64; NUM_FEATURES] {
        &self.0
    }

    /// Pairs each value with the feature at its position
    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        Feature::ALL.iter().copied().zip(self.0.iter().copied())
    }

    /// First feature holding NaN or an infinity
    pub fn first_non_finite(&self) -> Option<Feature> {
        self.iter().find(|(_, v)| !v.is_finite()).map(|(f, _)| f)
    }
}

impl Index<Feature> for FeatureVector {
    type Output = f64;

    fn index(&self, feature: Feature) -> &f64 {
        &self.0[feature.index()]
    }
}

impl IndexMut<Feature> for FeatureVector {
    fn index_mut(&mut self, feature: Feature) -> &mut f64 {
        &mut self.0[feature.index()]
    }
}

/// Binary potability verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// Class 0
    NotPotable,
    /// Class 1
    Potable,
}

impl Label {
    pub fn as_str(self) -> &'static str {
        match self {
            Label::NotPotable => "not_potable",
            Label::Potable => "potable",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::NotPotable => f.write_str("Not Potable"),
            Label::Potable => f.write_str("Potable"),
        }
    }
}

/// Per-class probabilities; the two values sum to 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    pub not_potable: f64,
    pub potable: f64,
}

impl ClassProbabilities {
    /// Builds both probabilities from the positive-class probability
    pub fn from_potable(potable: f64) -> Self {
        Self {
            not_potable: 1.0 - potable,
            potable,
        }
    }

    pub fn of(&self, label: Label) -> f64 {
        match label {
            Label::NotPotable => self.not_potable,
            Label::Potable => self.potable,
        }
    }

    /// Most probable label; ties resolve to the first class
    pub fn argmax(&self) -> Label {
        if self.potable > self.not_potable {
            Label::Potable
        } else {
            Label::NotPotable
        }
    }
}

/// Importance weights of the fitted classifier, aligned with [`Feature::ALL`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureImportances([f64; NUM_FEATURES]);

impl FeatureImportances {
    /// Accepted deviation of the importance sum from 1.0
    pub const SUM_TOLERANCE: f64 = 1e-3;

    /// Validates and wraps importance weights
    pub fn new(values: [f64; NUM_FEATURES]) -> Result<Self, String> {
        if let Some((i, v)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(format!(
                "importance of {} must be finite and non-negative, got {}",
                Feature::ALL[i],
                v
            ));
        }
        let sum: f64 = values.iter().sum();
        if (sum - 1.0).abs() > Self::SUM_TOLERANCE {
            return Err(format!("importances sum to {}, expected 1.0", sum));
        }
        Ok(Self(values))
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.0[feature.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        Feature::ALL.iter().copied().zip(self.0.iter().copied())
    }
}

/// Verdict and the probability of the predicted label
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: Label,
    /// Probability of `label`, in [0, 1]
    pub confidence: f64,
}

impl PredictionResult {
    pub fn confidence_percent(&self) -> f64 {
        self.confidence * 100.0
    }
}
