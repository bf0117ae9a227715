//! Model input column ordering
//!
//! Builds the single input row handed to a regressor from an unordered
//! feature mapping.

use crate::models::{FeatureSet, Task};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Column order used when an artifact does not record its trained feature names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnOrder {
    /// Lexicographically sorted caller keys.
    ///
    /// Only correct when the model was trained on exactly those keys in
    /// sorted order; otherwise columns are silently misaligned.
    #[default]
    SortedKeys,
    /// The task's training column order from [`Task::feature_defaults`]
    Canonical,
}

/// Build the input row for `task`.
///
/// `trained_names` always wins when present; missing features become `0`.
pub fn order_columns(
    task: Task,
    features: &FeatureSet,
    trained_names: Option<&[String]>,
    policy: ColumnOrder,
) -> Vec<f32> {
    if let Some(names) = trained_names {
        return names.iter().map(|n| value_or_zero(features, n)).collect();
    }

    match policy {
        ColumnOrder::SortedKeys => {
            let mut keys: Vec<&String> = features.keys().collect();
            keys.sort();
            warn!(
                task = %task,
                columns = ?keys,
                "Artifact has no trained feature names, using sorted request keys"
            );
            keys.into_iter().map(|k| features[k] as f32).collect()
        }
        ColumnOrder::Canonical => task
            .feature_defaults()
            .iter()
            .map(|(n, _)| value_or_zero(features, n))
            .collect(),
    }
}

fn value_or_zero(features: &FeatureSet, name: &str) -> f32 {
    features.get(name).copied().unwrap_or(0.0) as f32
}
