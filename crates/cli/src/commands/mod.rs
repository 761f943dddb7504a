//! CLI subcommands

pub mod inspect;
pub mod predict;

use crate::output::format_value;
use potability_lib::predictor::ReferenceRow;
use tabled::Tabled;

/// Row for the parameter reference table
#[derive(Tabled)]
pub struct ReferenceTableRow {
    #[tabled(rename = "Parameter")]
    parameter: String,
    #[tabled(rename = "Current Value")]
    current_value: String,
    #[tabled(rename = "Safe Range")]
    safe_range: String,
}

pub fn reference_rows(rows: &[ReferenceRow]) -> Vec<ReferenceTableRow> {
    rows.iter()
        .map(|row| ReferenceTableRow {
            parameter: row.parameter.clone(),
            current_value: row.current_value.map(format_value).unwrap_or_else(|| "-".to_string()),
            safe_range: row.safe_range.clone(),
        })
        .collect()
}
