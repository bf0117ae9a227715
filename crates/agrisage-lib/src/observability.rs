//! Observability infrastructure for the prediction service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, model inference latency,
//!   prediction source, artifact loads)
//! - Structured JSON logging with tracing

use crate::models::Task;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter, register_int_counter_vec,
    Histogram, HistogramVec, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ResolverMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct ResolverMetricsInner {
    prediction_latency_seconds: Histogram,
    model_inference_seconds: HistogramVec,
    predictions: IntCounterVec,
    unknown_tasks: IntCounter,
    artifact_loads: IntCounterVec,
    invocation_failures: IntCounterVec,
}

impl ResolverMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "agrisage_prediction_latency_seconds",
                "Time spent resolving a prediction, including any first artifact load",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            model_inference_seconds: register_histogram_vec!(
                "agrisage_model_inference_seconds",
                "Time spent in a loaded model's predict call, by task",
                &["task"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register model_inference_seconds"),

            predictions: register_int_counter_vec!(
                "agrisage_predictions_total",
                "Predictions served, by task and source (model or heuristic)",
                &["task", "source"]
            )
            .expect("Failed to register predictions_total"),

            unknown_tasks: register_int_counter!(
                "agrisage_unknown_tasks_total",
                "Resolve calls naming an unknown task"
            )
            .expect("Failed to register unknown_tasks_total"),

            artifact_loads: register_int_counter_vec!(
                "agrisage_artifact_loads_total",
                "Artifact load attempts, by task and outcome (loaded, missing, failed)",
                &["task", "outcome"]
            )
            .expect("Failed to register artifact_loads_total"),

            invocation_failures: register_int_counter_vec!(
                "agrisage_model_invocation_failures_total",
                "Model invocations that failed and fell back to heuristics",
                &["task"]
            )
            .expect("Failed to register model_invocation_failures_total"),
        }
    }
}

/// Where a served prediction came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionSource {
    Model,
    Heuristic,
}

impl PredictionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionSource::Model => "model",
            PredictionSource::Heuristic => "heuristic",
        }
    }
}

/// Resolver metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct ResolverMetrics {
    _private: (),
}

impl Default for ResolverMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ResolverMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ResolverMetricsInner {
        GLOBAL_METRICS.get_or_init(ResolverMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    /// Record one model invocation, successful or not
    pub fn observe_model_inference(&self, task: Task, duration_secs: f64) {
        self.inner()
            .model_inference_seconds
            .with_label_values(&[task.as_str()])
            .observe(duration_secs);
    }

    pub fn inc_predictions(&self, task: Task, source: PredictionSource) {
        self.inner()
            .predictions
            .with_label_values(&[task.as_str(), source.as_str()])
            .inc();
    }

    pub fn inc_unknown_tasks(&self) {
        self.inner().unknown_tasks.inc();
    }

    /// `outcome` is one of `loaded`, `missing`, `failed`
    pub fn inc_artifact_loads(&self, task: Task, outcome: &str) {
        self.inner()
            .artifact_loads
            .with_label_values(&[task.as_str(), outcome])
            .inc();
    }

    pub fn inc_invocation_failures(&self, task: Task) {
        self.inner()
            .invocation_failures
            .with_label_values(&[task.as_str()])
            .inc();
    }
}

/// Structured logger for service events
///
/// Provides consistent JSON-formatted logging for predictions,
/// artifact lifecycle, and server lifecycle.
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

    /// Log a resolved prediction
    pub fn log_prediction(&self, task: Task, prediction: f64, used_model: bool, elapsed_us: u128) {
        debug!(
            event = "prediction_resolved",
            service = %self.service,
            task = %task,
            prediction = prediction,
            used_model = used_model,
            elapsed_us = elapsed_us,
            "Resolved prediction"
        );
    }

    /// Log an unknown task request
    pub fn log_unknown_task(&self, task: &str) {
        info!(
            event = "unknown_task",
            service = %self.service,
            task = %task,
            "Prediction requested for unknown task"
        );
    }

    /// Log a successful artifact load
    pub fn log_artifact_loaded(&self, task: Task, version: &str, has_feature_names: bool) {
        info!(
            event = "artifact_loaded",
            service = %self.service,
            task = %task,
            version = %version,
            has_feature_names = has_feature_names,
            "Trained model loaded"
        );
    }

    /// Log a task left without a model
    pub fn log_artifact_unavailable(&self, task: Task, reason: &str, missing: bool) {
        if missing {
            info!(
                event = "artifact_unavailable",
                service = %self.service,
                task = %task,
                reason = %reason,
                "No trained model, using heuristics"
            );
        } else {
            warn!(
                event = "artifact_unavailable",
                service = %self.service,
                task = %task,
                reason = %reason,
                "Trained model failed to load, using heuristics"
            );
        }
    }

    /// Log a model invocation that fell back to heuristics
    pub fn log_invocation_failed(&self, task: Task, reason: &str) {
        warn!(
            event = "model_invocation_failed",
            service = %self.service,
            task = %task,
            reason = %reason,
            "Model invocation failed, falling back to heuristics"
        );
    }

    /// Log server startup
    pub fn log_startup(&self, version: &str, model_dir: &str, port: u16) {
        info!(
            event = "server_started",
            service = %self.service,
            server_version = %version,
            model_dir = %model_dir,
            port = port,
            "Prediction server started"
        );
    }

    /// Log server shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "server_shutdown",
            service = %self.service,
            reason = %reason,
            "Prediction server shutting down"
        );
    }
}
