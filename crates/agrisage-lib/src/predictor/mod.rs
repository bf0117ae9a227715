//! Prediction engine: trained regressors with heuristic fallback

mod columns;
mod heuristics;
mod inference;
mod resolver;

pub use columns::{order_columns, ColumnOrder};
pub use heuristics::{round2, HeuristicPredictor};
pub use inference::OnnxRegressor;
pub use resolver::{ModelOutcome, PredictionResolver, TaskDescription};

use crate::error::InferenceError;

/// A previously trained regressor for one task
pub trait Regressor: Send + Sync {
    /// Feature names in the order the model was trained on, if recorded
    fn feature_names(&self) -> Option<&[String]>;

    /// Version label of the artifact
    fn version(&self) -> &str;

    /// Predict a scalar from a single input row
    fn predict(&self, row: &[f32]) -> Result<f64, InferenceError>;
}
