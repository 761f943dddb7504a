//! Potability prediction command

use anyhow::{Context, Result};
use potability_lib::{ArtifactConfig, Artifacts, PredictionReport, RawMeasurement};
use tabled::Tabled;

use super::reference_rows;
use crate::output::{
    format_percent, importance_bar, print_heading, print_json, print_table, print_verdict,
    print_warning, OutputFormat,
};

/// Row for the feature importance chart
#[derive(Tabled)]
struct ImportanceRow {
    #[tabled(rename = "Feature")]
    feature: String,
    #[tabled(rename = "Importance")]
    importance: String,
    #[tabled(rename = "")]
    bar: String,
}

/// Load the fitted artifacts and predict potability for one sample
pub fn run_prediction(
    artifacts: &ArtifactConfig,
    measurement: &RawMeasurement,
    format: OutputFormat,
) -> Result<()> {
    let artifacts = Artifacts::load(artifacts).context("Failed to load fitted artifacts")?;
    let predictor = artifacts.into_predictor();

    let report = predictor
        .predict(measurement)
        .context("Error during prediction")?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => render_report(measurement, &report),
    }
    Ok(())
}

fn render_report(measurement: &RawMeasurement, report: &PredictionReport) {
    print_heading("Prediction Result");
    print_verdict(report.result.label, report.result.confidence);
    println!(
        "  p(potable) = {}, p(not potable) = {}",
        format_percent(report.probabilities.potable),
        format_percent(report.probabilities.not_potable)
    );
    for feature in measurement.out_of_domain() {
        if let Some(domain) = feature.input_domain() {
            print_warning(&format!(
                "{} is outside the expected input range {}–{}",
                feature.label(),
                domain.start(),
                domain.end()
            ));
        }
    }

    print_heading("Feature Importance");
    let max = report
        .feature_importance
        .first()
        .map(|e| e.importance)
        .unwrap_or(0.0);
    let rows: Vec<ImportanceRow> = report
        .feature_importance
        .iter()
        .map(|entry| ImportanceRow {
            feature: entry.label.clone(),
            importance: format!("{:.4}", entry.importance),
            bar: importance_bar(entry.importance, max),
        })
        .collect();
    print_table(&rows);

    print_heading("Parameter Reference");
    print_table(&reference_rows(&report.reference));
}
