//! Observability infrastructure for the potability predictor
//!
//! Provides:
//! - Prometheus metrics (prediction latency, verdict counts, inference errors, model info)
//! - Structured JSON logging with tracing

use crate::error::{InferenceError, StartupError};
use crate::models::{Label, PredictionResult};
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    GaugeVec, Histogram, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Histogram buckets for prediction latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.05,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<PredictorMetricsInner> = OnceLock::new();

struct PredictorMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounterVec,
    inference_errors_total: IntCounter,
    model_info: GaugeVec,
}

impl PredictorMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "potability_prediction_latency_seconds",
                "Time spent deriving features, scaling and running the classifier",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter_vec!(
                "potability_predictions_total",
                "Successful predictions by verdict",
                &["label"]
            )
            .expect("Failed to register predictions_total"),

            inference_errors_total: register_int_counter!(
                "potability_inference_errors_total",
                "Prediction requests that failed during inference"
            )
            .expect("Failed to register inference_errors_total"),

            model_info: register_gauge_vec!(
                "potability_model_info",
                "Checksums of the loaded fitted artifacts",
                &["model_version", "scaler_checksum"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Handle to the process-wide prediction metrics.
///
/// Clones share the same underlying Prometheus collectors.
#[derive(Clone)]
pub struct PredictorMetrics {
    _private: (),
}

impl Default for PredictorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(PredictorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &PredictorMetricsInner {
        GLOBAL_METRICS.get_or_init(PredictorMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self, label: Label) {
        self.inner()
            .predictions_total
            .with_label_values(&[label.as_str()])
            .inc();
    }

    pub fn inc_inference_errors(&self) {
        self.inner().inference_errors_total.inc();
    }

    pub fn set_model_info(&self, model_version: &str, scaler_checksum: &str) {
        let gauge = &self.inner().model_info;
        gauge.reset();
        gauge
            .with_label_values(&[model_version, scaler_checksum])
            .set(1.0);
    }
}

/// Event-style log lines for the prediction service
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_startup(&self, version: &str, model_version: &str) {
        info!(
            event = "service_started",
            service = %self.service,
            version = %version,
            model_version = %model_version,
            "Potability predictor started"
        );
    }

    /// Artifacts could not be loaded; the process will not serve requests
    pub fn log_startup_failure(&self, err: &StartupError) {
        error!(
            event = "startup_failed",
            service = %self.service,
            artifact = %err.kind(),
            error = %err,
            "Fatal configuration error, refusing to serve requests"
        );
    }

    pub fn log_prediction(&self, result: &PredictionResult, elapsed_us: u128) {
        info!(
            event = "prediction_generated",
            service = %self.service,
            label = result.label.as_str(),
            confidence = result.confidence,
            elapsed_us = elapsed_us as u64,
            "Generated potability prediction"
        );
    }

    pub fn log_inference_error(&self, err: &InferenceError) {
        warn!(
            event = "inference_failed",
            service = %self.service,
            error = %err,
            "Prediction request failed"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Potability predictor shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_handles_share_registry() {
        let metrics = PredictorMetrics::new();
        let clone = metrics.clone();

        metrics.observe_prediction_latency(0.0002);
        metrics.inc_predictions(Label::Potable);
        clone.inc_predictions(Label::Potable);
        clone.inc_inference_errors();
        metrics.set_model_info("abc123def456", "0123");

        let count = metrics
            .inner()
            .predictions_total
            .with_label_values(&["potable"])
            .get();
        assert!(count >= 2);
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("potability-server");
        assert_eq!(logger.service, "potability-server");
    }
}
