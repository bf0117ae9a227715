//! ONNX regressor inference using tract
//!
//! Trained regressors are exported to ONNX and run in-process with
//! tract-onnx. Each artifact predicts a single scalar from one input row.

use super::Regressor;
use crate::error::{ArtifactError, InferenceError};
use std::io::Cursor;
use std::path::Path;
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Maximum inference latency before warning (5ms target)
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Regressor artifact backed by an optimized tract plan
pub struct OnnxRegressor {
    plan: TractModel,
    feature_names: Option<Vec<String>>,
    version: String,
}

impl OnnxRegressor {
    /// Build a regressor from serialized ONNX bytes.
    ///
    /// With known feature names the input is pinned to `[1, names.len()]`;
    /// otherwise the model's declared input shape is kept.
    pub fn from_bytes(
        path: &Path,
        model_bytes: &[u8],
        feature_names: Option<Vec<String>>,
        version: impl Into<String>,
    ) -> Result<Self, ArtifactError> {
        let columns = feature_names.as_ref().map(Vec::len);
        let plan = Self::load_plan(model_bytes, columns).map_err(|e| ArtifactError::Model {
            path: path.to_path_buf(),
            reason: format!("{e:#}"),
        })?;

        Ok(Self {
            plan,
            feature_names,
            version: version.into(),
        })
    }

    fn load_plan(model_bytes: &[u8], columns: Option<usize>) -> TractResult<TractModel> {
        let mut model = tract_onnx::onnx().model_for_read(&mut Cursor::new(model_bytes))?;
        if let Some(n) = columns {
            model = model.with_input_fact(0, f32::fact([1, n]).into())?;
        }
        model.into_optimized()?.into_runnable()
    }

    fn row_to_tensor(row: &[f32]) -> Result<Tensor, InferenceError> {
        tract_ndarray::Array2::from_shape_vec((1, row.len()), row.to_vec())
            .map(Tensor::from)
            .map_err(|e| InferenceError::Runtime(e.to_string()))
    }

    fn first_output(outputs: &TVec<TValue>) -> Result<f64, InferenceError> {
        let output = outputs.first().ok_or(InferenceError::EmptyOutput)?;
        let values = output
            .cast_to::<f64>()
            .map_err(|e| InferenceError::Runtime(format!("{e:#}")))?;
        let view = values
            .to_array_view::<f64>()
            .map_err(|e| InferenceError::Runtime(format!("{e:#}")))?;
        let value = view.iter().next().copied().ok_or(InferenceError::EmptyOutput)?;

        if !value.is_finite() {
            return Err(InferenceError::NonFinite(value));
        }
        Ok(value)
    }
}

impl Regressor for OnnxRegressor {
    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn predict(&self, row: &[f32]) -> Result<f64, InferenceError> {
        if let Some(names) = &self.feature_names {
            if names.len() != row.len() {
                return Err(InferenceError::ColumnMismatch {
                    expected: names.len(),
                    actual: row.len(),
                });
            }
        }

        let start = Instant::now();
        let input = Self::row_to_tensor(row)?;
        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| InferenceError::Runtime(format!("{e:#}")))?;
        let value = Self::first_output(&outputs)?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(value)
    }
}
