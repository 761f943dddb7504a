//! Health tracking for the prediction service
//!
//! Readiness flips once the fitted artifacts are loaded and never flips
//! back. Liveness reports `degraded` while predictions keep failing, which
//! points at bad inputs or a model problem without taking the service down.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Consecutive inference failures after which the predictor is degraded
pub const DEGRADED_AFTER_FAILURES: u32 = 3;

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Operational, with recent failures
    Degraded,
    Unhealthy,
}

impl ComponentStatus {
    pub fn is_operational(&self) -> bool {
        matches!(self, ComponentStatus::Healthy | ComponentStatus::Degraded)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn new(status: ComponentStatus, message: Option<String>, timestamp: i64) -> Self {
        Self {
            status,
            message,
            last_check_timestamp: timestamp,
        }
    }
}

/// Overall health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: BTreeMap<String, ComponentHealth>,
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

/// Component names for health tracking
pub mod components {
    pub const ARTIFACTS: &str = "artifacts";
    pub const PREDICTOR: &str = "predictor";
}

#[derive(Debug, Default)]
struct State {
    model_version: Option<String>,
    consecutive_failures: u32,
    last_error: Option<String>,
    last_loaded: i64,
    last_prediction: i64,
}

/// Shared health state; clones observe the same registry
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    state: Arc<RwLock<State>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the fitted artifacts are loaded
    pub async fn mark_loaded(&self, model_version: impl Into<String>) {
        let mut state = self.state.write().await;
        state.model_version = Some(model_version.into());
        state.last_loaded = chrono::Utc::now().timestamp();
    }

    /// Record the outcome of one prediction request
    pub async fn record_prediction(&self, error: Option<&str>) {
        let mut state = self.state.write().await;
        match error {
            Some(message) => {
                state.consecutive_failures = state.consecutive_failures.saturating_add(1);
                state.last_error = Some(message.to_string());
            }
            None => {
                state.consecutive_failures = 0;
                state.last_error = None;
            }
        }
        state.last_prediction = chrono::Utc::now().timestamp();
    }

    pub async fn health(&self) -> HealthResponse {
        let state = self.state.read().await;
        let mut entries = BTreeMap::new();

        let artifacts = match &state.model_version {
            Some(version) => ComponentHealth::new(
                ComponentStatus::Healthy,
                Some(format!("model {}", version)),
                state.last_loaded,
            ),
            None => ComponentHealth::new(
                ComponentStatus::Unhealthy,
                Some("fitted artifacts not loaded".to_string()),
                chrono::Utc::now().timestamp(),
            ),
        };
        entries.insert(components::ARTIFACTS.to_string(), artifacts);

        let predictor = if state.consecutive_failures >= DEGRADED_AFTER_FAILURES {
            ComponentHealth::new(
                ComponentStatus::Degraded,
                Some(format!(
                    "{} consecutive inference failures, last: {}",
                    state.consecutive_failures,
                    state.last_error.as_deref().unwrap_or("unknown")
                )),
                state.last_prediction,
            )
        } else {
            ComponentHealth::new(ComponentStatus::Healthy, None, state.last_prediction)
        };
        entries.insert(components::PREDICTOR.to_string(), predictor);

        HealthResponse {
            status: overall_status(&entries),
            components: entries,
        }
    }

    pub async fn readiness(&self) -> ReadinessResponse {
        let state = self.state.read().await;
        match &state.model_version {
            Some(version) => ReadinessResponse {
                ready: true,
                reason: None,
                model_version: Some(version.clone()),
            },
            None => ReadinessResponse {
                ready: false,
                reason: Some("Fitted artifacts not loaded".to_string()),
                model_version: None,
            },
        }
    }
}

/// Worst status wins
fn overall_status(components: &BTreeMap<String, ComponentHealth>) -> ComponentStatus {
    let mut status = ComponentStatus::Healthy;
    for health in components.values() {
        match health.status {
            ComponentStatus::Unhealthy => return ComponentStatus::Unhealthy,
            ComponentStatus::Degraded => status = ComponentStatus::Degraded,
            ComponentStatus::Healthy => {}
        }
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_not_ready_before_load() {
        let registry = HealthRegistry::new();
        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
        assert!(readiness.reason.is_some());

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Unhealthy);
        assert!(!health.status.is_operational());
    }

    #[tokio::test]
    async fn test_ready_after_load() {
        let registry = HealthRegistry::new();
        registry.mark_loaded("abc123").await;

        let readiness = registry.readiness().await;
        assert!(readiness.ready);
        assert_eq!(readiness.model_version.as_deref(), Some("abc123"));
        assert_eq!(registry.health().await.status, ComponentStatus::Healthy);
    }

    #[tokio::test]
    async fn test_degraded_after_repeated_failures() {
        let registry = HealthRegistry::new();
        registry.mark_loaded("abc123").await;

        for _ in 0..DEGRADED_AFTER_FAILURES {
            registry.record_prediction(Some("feature ph is not a finite number")).await;
        }
        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Degraded);
        assert!(health.status.is_operational());
        let message = health.components[components::PREDICTOR].message.clone().unwrap();
        assert!(message.contains("not a finite number"));

        // Still ready while degraded
        assert!(registry.readiness().await.ready);
    }

    #[tokio::test]
    async fn test_success_clears_failures() {
        let registry = HealthRegistry::new();
        registry.mark_loaded("abc123").await;
        for _ in 0..DEGRADED_AFTER_FAILURES {
            registry.record_prediction(Some("boom")).await;
        }
        registry.record_prediction(None).await;
        assert_eq!(registry.health().await.status, ComponentStatus::Healthy);
    }
}
