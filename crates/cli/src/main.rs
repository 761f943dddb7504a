//! Water Potability Predictor CLI
//!
//! Predicts potability for a single water sample from the fitted artifacts,
//! and shows the derived feature vector and the safe-range reference table.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::{inspect, predict};
use potability_lib::RawMeasurement;
use std::path::PathBuf;

/// Water Potability Predictor CLI
#[derive(Parser)]
#[command(name = "potability")]
#[command(author, version, about = "CLI for the Water Potability Predictor", long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    pub format: output::OutputFormat,

    /// Path to the fitted scaler artifact
    #[arg(long, global = true, env = "POTABILITY_SCALER")]
    pub scaler: Option<PathBuf>,

    /// Path to the fitted classifier artifact
    #[arg(long, global = true, env = "POTABILITY_CLASSIFIER")]
    pub classifier: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict potability for one water sample
    Predict(MeasurementArgs),

    /// Show the derived feature vector for one water sample
    Features(MeasurementArgs),

    /// Show the safe range of every parameter
    Ranges,
}

/// The nine raw measurements; unset values take the form defaults
#[derive(Args)]
pub struct MeasurementArgs {
    /// pH (0-14)
    #[arg(long, allow_negative_numbers = true, default_value_t = 7.0)]
    pub ph: f64,

    /// Hardness in mg/L
    #[arg(long, allow_negative_numbers = true, default_value_t = 196.0)]
    pub hardness: f64,

    /// Total dissolved solids in ppm
    #[arg(long, allow_negative_numbers = true, default_value_t = 22000.0)]
    pub solids: f64,

    /// Chloramines in ppm
    #[arg(long, allow_negative_numbers = true, default_value_t = 7.12)]
    pub chloramines: f64,

    /// Sulfate in mg/L
    #[arg(long, allow_negative_numbers = true, default_value_t = 333.0)]
    pub sulfate: f64,

    /// Conductivity in μS/cm
    #[arg(long, allow_negative_numbers = true, default_value_t = 426.0)]
    pub conductivity: f64,

    /// Organic carbon in ppm
    #[arg(long, allow_negative_numbers = true, default_value_t = 14.3)]
    pub organic_carbon: f64,

    /// Trihalomethanes in μg/L
    #[arg(long, allow_negative_numbers = true, default_value_t = 66.0)]
    pub trihalomethanes: f64,

    /// Turbidity in NTU
    #[arg(long, allow_negative_numbers = true, default_value_t = 3.97)]
    pub turbidity: f64,
}

impl From<&MeasurementArgs> for RawMeasurement {
    fn from(args: &MeasurementArgs) -> Self {
        RawMeasurement {
            ph: args.ph,
            hardness: args.hardness,
            solids: args.solids,
            chloramines: args.chloramines,
            sulfate: args.sulfate,
            conductivity: args.conductivity,
            organic_carbon: args.organic_carbon,
            trihalomethanes: args.trihalomethanes,
            turbidity: args.turbidity,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Predict(ref args) => {
            let artifacts = config::Config::load()?.artifacts(cli.scaler, cli.classifier);
            predict::run_prediction(&artifacts, &args.into(), cli.format)
        }
        Commands::Features(ref args) => inspect::show_features(&args.into(), cli.format),
        Commands::Ranges => inspect::show_ranges(cli.format),
    }
}
