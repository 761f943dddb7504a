//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use potability_lib::Label;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Width of a full-length importance bar, in cells
pub const BAR_WIDTH: usize = 30;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print rows as a rounded table
pub fn print_table<T: Tabled>(items: &[T]) {
    if items.is_empty() {
        println!("{}", "No items found".yellow());
        return;
    }
    let table = Table::new(items).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_error(message: &str) {
    println!("{} {}", "✗".red().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print a section heading
pub fn print_heading(title: &str) {
    println!();
    println!("{}", title.bold());
}

/// Format a probability as percentage with two decimals
pub fn format_percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// Format a measurement without trailing noise
pub fn format_value(value: f64) -> String {
    if value != 0.0 && value.abs() < 0.01 {
        format!("{:.5}", value)
    } else {
        format!("{:.3}", value)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

/// Horizontal bar proportional to `value / max`
pub fn importance_bar(value: f64, max: f64) -> String {
    if max <= 0.0 || !value.is_finite() {
        return String::new();
    }
    let cells = ((value / max) * BAR_WIDTH as f64).round().clamp(0.0, BAR_WIDTH as f64) as usize;
    "█".repeat(cells).blue().to_string()
}

/// Verdict line with confidence
pub fn print_verdict(label: Label, confidence: f64) {
    let message = format!("Water is {} ({} confidence)", label, format_percent(confidence));
    match label {
        Label::Potable => print_success(&message),
        Label::NotPotable => print_error(&message),
    }
}
