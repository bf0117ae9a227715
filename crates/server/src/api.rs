//! HTTP API for predictions, health checks and Prometheus metrics

use agrisage_lib::{
    health::{ComponentStatus, HealthRegistry},
    predictor::TaskDescription,
    FeatureSet, PredictionResolver, PredictionResult,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub resolver: Arc<PredictionResolver>,
}

impl AppState {
    pub fn new(health_registry: HealthRegistry, resolver: Arc<PredictionResolver>) -> Self {
        Self {
            health_registry,
            resolver,
        }
    }
}

/// Body of `POST /api/predict`
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub features: FeatureSet,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub result: PredictionResult,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskCatalog {
    pub tasks: Vec<TaskDescription>,
}

/// Errors surfaced at the transport boundary
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No task specified")]
    MissingTask,

    #[error("{0}")]
    MalformedBody(String),

    #[error("Prediction worker failed: {0}")]
    Worker(String),

    #[error("Failed to encode metrics: {0}")]
    Metrics(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingTask => StatusCode::BAD_REQUEST,
            ApiError::MalformedBody(_) | ApiError::Worker(_) | ApiError::Metrics(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Resolve a prediction; the resolver itself never fails
async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::MalformedBody(e.body_text()))?;

    let task = request
        .task
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::MissingTask)?;

    let resolver = state.resolver.clone();
    let features = request.features;
    let result = tokio::task::spawn_blocking(move || resolver.resolve(&task, &features))
        .await
        .map_err(|e| {
            error!(error = %e, "Prediction task panicked");
            ApiError::Worker(e.to_string())
        })?;

    Ok(Json(PredictResponse { result }))
}

async fn tasks(State(state): State<Arc<AppState>>) -> Json<TaskCatalog> {
    Json(TaskCatalog {
        tasks: state.resolver.task_catalog(),
    })
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
async fn metrics() -> Result<impl IntoResponse, ApiError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ApiError::Metrics(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    ))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/predict", post(predict))
        .route("/api/tasks", get(tasks))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server, returning when `shutdown` resolves
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
