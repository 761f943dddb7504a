//! HTTP API for predictions, health checks and Prometheus metrics

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use potability_lib::{
    health::HealthRegistry,
    observability::{PredictorMetrics, StructuredLogger},
    predictor::{derive_features, reference_table, ReferenceRow},
    ComponentStatus, Feature, InferenceError, PotabilityPredictor, PredictionReport,
    RawMeasurement,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: PotabilityPredictor,
    pub health_registry: HealthRegistry,
    pub metrics: PredictorMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        predictor: PotabilityPredictor,
        health_registry: HealthRegistry,
        metrics: PredictorMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            predictor,
            health_registry,
            metrics,
            logger,
        }
    }
}

/// Per-request failure, reported without affecting other requests
pub enum ApiError {
    /// Body missing, not JSON, or not a measurement
    Request(JsonRejection),
    Inference(InferenceError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Request(rejection)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Request(rejection) => (
                rejection.status(),
                ErrorBody {
                    error: rejection.body_text(),
                    kind: "request",
                },
            ),
            ApiError::Inference(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    error: err.to_string(),
                    kind: "inference",
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// One position of the derived feature vector
#[derive(Debug, Serialize)]
pub struct FeatureValue {
    pub feature: Feature,
    pub label: &'static str,
    pub derived: bool,
    pub value: f64,
}

async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RawMeasurement>, JsonRejection>,
) -> Result<Json<PredictionReport>, ApiError> {
    let Json(measurement) = payload?;
    let start = Instant::now();
    match state.predictor.predict(&measurement) {
        Ok(report) => {
            let elapsed = start.elapsed();
            state.metrics.observe_prediction_latency(elapsed.as_secs_f64());
            state.metrics.inc_predictions(report.result.label);
            state.logger.log_prediction(&report.result, elapsed.as_micros());
            state.health_registry.record_prediction(None).await;
            Ok(Json(report))
        }
        Err(err) => {
            state.metrics.inc_inference_errors();
            state.logger.log_inference_error(&err);
            state
                .health_registry
                .record_prediction(Some(&err.to_string()))
                .await;
            Err(ApiError::Inference(err))
        }
    }
}

async fn features(
    payload: Result<Json<RawMeasurement>, JsonRejection>,
) -> Result<Json<Vec<FeatureValue>>, ApiError> {
    let Json(measurement) = payload?;
    let vector = derive_features(&measurement);
    let values = vector
        .iter()
        .map(|(feature, value)| FeatureValue {
            feature,
            label: feature.label(),
            derived: !feature.is_raw(),
            value,
        })
        .collect();
    Ok(Json(values))
}

async fn reference_ranges() -> Json<Vec<ReferenceRow>> {
    Json(reference_table(None))
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/predict", post(predict))
        .route("/v1/features", post(features))
        .route("/v1/reference-ranges", get(reference_ranges))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use potability_lib::{
        predictor::StandardScaler, ClassProbabilities, Classifier, FeatureImportances,
        FeatureVector, Label, NUM_FEATURES,
    };
    use tower::ServiceExt;

    /// Fails for samples with sulfate above 400, otherwise potable at 0.7
    struct PickyClassifier {
        importances: FeatureImportances,
    }

    impl Classifier for PickyClassifier {
        fn predict(&self, features: &FeatureVector) -> Result<Label, InferenceError> {
            if features[Feature::Sulfate] > 400.0 {
                return Err(InferenceError::Classifier("tree evaluation failed".into()));
            }
            Ok(Label::Potable)
        }

        fn predict_probability(
            &self,
            _features: &FeatureVector,
        ) -> Result<ClassProbabilities, InferenceError> {
            Ok(ClassProbabilities::from_potable(0.7))
        }

        fn feature_importances(&self) -> &FeatureImportances {
            &self.importances
        }
    }

    async fn setup_test_app() -> (Router, Arc<AppState>) {
        let classifier = PickyClassifier {
            importances: FeatureImportances::new([1.0 / NUM_FEATURES as f64; NUM_FEATURES])
                .unwrap(),
        };
        let predictor =
            PotabilityPredictor::new(Arc::new(StandardScaler::identity()), Arc::new(classifier));

        let health_registry = HealthRegistry::new();
        health_registry.mark_loaded("test-model").await;

        let state = Arc::new(AppState::new(
            predictor,
            health_registry,
            PredictorMetrics::new(),
            StructuredLogger::new("test"),
        ));
        (create_router(state.clone()), state)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_predict_returns_full_report() {
        let (app, _state) = setup_test_app().await;

        let response = app
            .oneshot(post_json("/v1/predict", r#"{"ph": 7.4, "sulfate": 300.0}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let report = json_body(response).await;
        assert_eq!(report["result"]["label"], "potable");
        let confidence = report["result"]["confidence"].as_f64().unwrap();
        assert!((confidence - 0.7).abs() < 1e-9);
        assert_eq!(report["feature_importance"].as_array().unwrap().len(), 15);
        assert_eq!(report["reference"].as_array().unwrap().len(), 9);
        assert_eq!(report["reference"][0]["current_value"], 7.4);
        assert_eq!(report["features"].as_array().unwrap().len(), 15);
    }

    #[tokio::test]
    async fn test_inference_failure_is_per_request() {
        let (app, state) = setup_test_app().await;

        let response = app
            .clone()
            .oneshot(post_json("/v1/predict", r#"{"sulfate": 450.0}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["kind"], "inference");
        assert!(body["error"].as_str().unwrap().contains("tree evaluation failed"));
        assert!(body.get("result").is_none());

        let response = app
            .oneshot(post_json("/v1/predict", r#"{"sulfate": 333.0}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.health_registry.readiness().await.ready);
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_request_error() {
        let (app, state) = setup_test_app().await;

        let response = app
            .clone()
            .oneshot(post_json("/v1/predict", r#"{"ph": "abc"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["kind"], "request");
        assert!(!body["error"].as_str().unwrap().is_empty());

        let response = app
            .clone()
            .oneshot(post_json("/v1/predict", "{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["kind"], "request");

        let response = app
            .oneshot(post_json("/v1/features", r#""tap water""#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await["kind"], "request");

        // Rejected bodies never reach the model
        let health = state.health_registry.health().await;
        assert_eq!(health.status, ComponentStatus::Healthy);
    }

    #[tokio::test]
    async fn test_features_endpoint_orders_vector() {
        let (app, _state) = setup_test_app().await;

        let response = app
            .oneshot(post_json("/v1/features", r#"{"conductivity": 0.0}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let values = json_body(response).await;
        let values = values.as_array().unwrap();
        assert_eq!(values.len(), 15);
        assert_eq!(values[0]["feature"], "ph");
        assert_eq!(values[9]["feature"], "tds_to_conductivity");
        assert_eq!(values[9]["value"], 0.0);
        assert_eq!(values[13]["value"], 0.0);
        assert_eq!(values[14]["label"], "Organic Load");
        assert_eq!(values[14]["derived"], true);
    }

    #[tokio::test]
    async fn test_reference_ranges() {
        let (app, _state) = setup_test_app().await;

        let response = app.oneshot(get_request("/v1/reference-ranges")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let rows = json_body(response).await;
        assert_eq!(rows[0]["parameter"], "pH");
        assert_eq!(rows[0]["safe_range"], "6.5–8.5");
        assert!(rows[0].get("current_value").is_none());
    }

    #[tokio::test]
    async fn test_healthz_and_readyz() {
        let (app, _state) = setup_test_app().await;

        let response = app.clone().oneshot(get_request("/healthz")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "healthy");

        let response = app.oneshot(get_request("/readyz")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["model_version"], "test-model");
    }

    #[tokio::test]
    async fn test_readyz_unavailable_before_load() {
        let (_app, state) = setup_test_app().await;
        let unloaded = Arc::new(AppState::new(
            state.predictor.clone(),
            HealthRegistry::new(),
            PredictorMetrics::new(),
            StructuredLogger::new("test"),
        ));

        let response = create_router(unloaded).oneshot(get_request("/readyz")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let (app, _state) = setup_test_app().await;

        let _ = app
            .clone()
            .oneshot(post_json("/v1/predict", "{}"))
            .await
            .unwrap();

        let response = app.oneshot(get_request("/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("potability_predictions_total"));
    }
}
