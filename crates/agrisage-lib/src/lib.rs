//! Prediction library for the AgriSage service
//!
//! This crate provides the core functionality for:
//! - Resolving agricultural predictions from trained ONNX regressors
//! - Closed-form heuristic fallbacks when no model can answer
//! - The filesystem model store and per-task artifact cache
//! - Health checks and observability

pub mod cache;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod store;

pub use cache::{ArtifactCache, ArtifactStatus};
pub use error::{ArtifactError, InferenceError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ResolverMetrics, StructuredLogger};
pub use predictor::{ColumnOrder, PredictionResolver, Regressor};
pub use store::{ArtifactLoader, FsModelStore};
