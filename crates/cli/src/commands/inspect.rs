//! Commands that need no fitted artifacts

use anyhow::Result;
use potability_lib::{predictor::derive_features, predictor::reference_table, RawMeasurement};
use tabled::Tabled;

use super::reference_rows;
use crate::output::{format_value, print_json, print_table, OutputFormat};

/// Row for the derived feature table
#[derive(Tabled)]
struct FeatureRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Feature")]
    feature: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Show the fifteen-position feature vector for a sample
pub fn show_features(measurement: &RawMeasurement, format: OutputFormat) -> Result<()> {
    let vector = derive_features(measurement);
    match format {
        OutputFormat::Json => print_json(&vector),
        OutputFormat::Table => {
            let rows: Vec<FeatureRow> = vector
                .iter()
                .map(|(feature, value)| FeatureRow {
                    position: feature.index(),
                    feature: feature.label().to_string(),
                    kind: if feature.is_raw() { "raw" } else { "derived" }.to_string(),
                    value: format_value(value),
                })
                .collect();
            print_table(&rows);
            Ok(())
        }
    }
}

/// Show the static safe-range table
pub fn show_ranges(format: OutputFormat) -> Result<()> {
    let rows = reference_table(None);
    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            print_table(&reference_rows(&rows));
            Ok(())
        }
    }
}
