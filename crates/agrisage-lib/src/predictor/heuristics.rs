//! Closed-form estimates used when no trained model can answer

use crate::models::{FeatureSet, Task};

/// Heuristic predictor, one formula per task
pub struct HeuristicPredictor;

impl HeuristicPredictor {
    /// Estimate for `task`, rounded to two decimals.
    ///
    /// Absent features take the task defaults from [`Task::feature_defaults`].
    pub fn predict(task: Task, features: &FeatureSet) -> f64 {
        let f = |name: &str| task.feature(features, name);

        let raw = match task {
            Task::CropPrice => {
                let month = f("month");
                let demand = f("demand_index");
                let avg_yield = f("avg_yield");
                100.0 * (1.0 + 0.05 * (12.0 - (6.0 - month).abs())) * demand / avg_yield.max(0.5)
            }
            Task::Yield => {
                0.002 * f("rainfall_mm") + 0.01 * f("fertilizer_kg_per_ha") * f("soil_index")
            }
            Task::PestRisk => {
                let risk =
                    (f("humidity") / 100.0) * (f("temperature_c") / 35.0) + 0.1 * f("recent_pests");
                risk.clamp(0.02, 1.0)
            }
            Task::FertilizerNeed => {
                let need = f("nitrogen_deficit_kg") * (1.0 + 0.1 * (3.0 - f("crop_stage")));
                need.max(0.0)
            }
            Task::RainfallRisk => (f("recent_7days_mm") / 100.0).clamp(0.01, 0.99),
        };

        round2(raw)
    }
}

/// Round to two decimal places.
///
/// Rounds the exact binary value, so `0.045` (stored just below) gives
/// `0.04` and exact ties go to even. Scaling by 100 first would round twice.
pub fn round2(value: f64) -> f64 {
    let rounded = format!("{value:.2}").parse::<f64>().unwrap_or(value);
    // 0.0 rather than -0.0 so a floored result never serialises as "-0.0"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
