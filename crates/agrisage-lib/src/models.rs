//! Core data models for the prediction service

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Caller-supplied named numeric inputs to a prediction
pub type FeatureSet = HashMap<String, f64>;

/// Message carried by the result of an unrecognised task
pub const UNKNOWN_TASK_ERROR: &str = "Unknown task";

/// Quantity a prediction is made for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    CropPrice,
    Yield,
    PestRisk,
    FertilizerNeed,
    RainfallRisk,
}

impl Task {
    pub const ALL: [Task; 5] = [
        Task::CropPrice,
        Task::Yield,
        Task::PestRisk,
        Task::FertilizerNeed,
        Task::RainfallRisk,
    ];

    /// Wire identifier of the task
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::CropPrice => "crop_price",
            Task::Yield => "yield",
            Task::PestRisk => "pest_risk",
            Task::FertilizerNeed => "fertilizer_need",
            Task::RainfallRisk => "rainfall_risk",
        }
    }

    /// File stem of the artifact trained for this task
    pub fn artifact_name(&self) -> &'static str {
        match self {
            Task::CropPrice => "crop_price",
            Task::Yield => "yield_model",
            Task::PestRisk => "pest_risk",
            Task::FertilizerNeed => "fertilizer_need",
            Task::RainfallRisk => "rainfall_risk",
        }
    }

    /// Inputs read by the heuristic with their defaults.
    ///
    /// The order is the column order the training data was stacked in,
    /// so it doubles as the canonical model input order.
    pub fn feature_defaults(&self) -> &'static [(&'static str, f64)] {
        match self {
            Task::CropPrice => &[("month", 6.0), ("demand_index", 1.0), ("avg_yield", 1.0)],
            Task::Yield => &[
                ("rainfall_mm", 500.0),
                ("fertilizer_kg_per_ha", 100.0),
                ("soil_index", 1.0),
            ],
            Task::PestRisk => &[
                ("humidity", 60.0),
                ("temperature_c", 28.0),
                ("recent_pests", 0.0),
            ],
            Task::FertilizerNeed => &[("nitrogen_deficit_kg", 20.0), ("crop_stage", 2.0)],
            Task::RainfallRisk => &[("recent_7days_mm", 40.0)],
        }
    }

    /// Value of `name` from `features`, or the task default for it
    pub fn feature(&self, features: &FeatureSet, name: &str) -> f64 {
        features.get(name).copied().unwrap_or_else(|| {
            self.feature_defaults()
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, d)| *d)
                .unwrap_or(0.0)
        })
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known task
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task '{0}'")]
pub struct UnknownTask(pub String);

impl FromStr for Task {
    type Err = UnknownTask;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Task::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownTask(s.to_string()))
    }
}

/// Outcome of a single resolve call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub task: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub used_model: bool,
}

impl PredictionResult {
    pub fn from_model(task: Task, prediction: f64) -> Self {
        Self {
            task: task.as_str().to_string(),
            prediction: Some(prediction),
            error: None,
            used_model: true,
        }
    }

    pub fn from_heuristic(task: Task, prediction: f64) -> Self {
        Self {
            task: task.as_str().to_string(),
            prediction: Some(prediction),
            error: None,
            used_model: false,
        }
    }

    pub fn unknown_task(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            prediction: None,
            error: Some(UNKNOWN_TASK_ERROR.to_string()),
            used_model: false,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
