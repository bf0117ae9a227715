//! Prediction resolution
//!
//! Prefers a trained regressor for the task when one loads and runs,
//! otherwise answers with the task heuristic. Never fails: the only
//! error-shaped output is the unknown-task result.

use super::{order_columns, ColumnOrder, HeuristicPredictor, Regressor};
use crate::cache::{ArtifactCache, ArtifactStatus};
use crate::error::{ArtifactError, InferenceError};
use crate::models::{FeatureSet, PredictionResult, Task};
use crate::observability::{PredictionSource, ResolverMetrics, StructuredLogger};
use crate::store::ArtifactLoader;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Result of the model-invocation step
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutcome {
    Predicted(f64),
    /// No artifact could be loaded for the task
    Unavailable,
    /// An artifact loaded but did not produce a prediction
    Failed(InferenceError),
}

/// A feature the heuristic reads and its default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDefault {
    pub name: String,
    pub default: f64,
}

/// Catalog entry for one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDescription {
    pub task: Task,
    pub artifact: String,
    pub defaults: Vec<FeatureDefault>,
    pub status: ArtifactStatus,
}

/// Maps `(task, features)` to a [`PredictionResult`]
pub struct PredictionResolver {
    loader: Arc<dyn ArtifactLoader>,
    cache: ArtifactCache,
    column_order: ColumnOrder,
    metrics: ResolverMetrics,
    logger: StructuredLogger,
}

impl PredictionResolver {
    pub fn new(loader: Arc<dyn ArtifactLoader>, column_order: ColumnOrder) -> Self {
        Self {
            loader,
            cache: ArtifactCache::new(),
            column_order,
            metrics: ResolverMetrics::new(),
            logger: StructuredLogger::new("agrisage"),
        }
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    /// Resolve a prediction for `task`
    pub fn resolve(&self, task: &str, features: &FeatureSet) -> PredictionResult {
        let start = Instant::now();

        let task = match task.parse::<Task>() {
            Ok(task) => task,
            Err(_) => {
                self.metrics.inc_unknown_tasks();
                self.logger.log_unknown_task(task);
                return PredictionResult::unknown_task(task);
            }
        };

        let result = match self.invoke_model(task, features) {
            ModelOutcome::Predicted(value) => {
                self.metrics.inc_predictions(task, PredictionSource::Model);
                PredictionResult::from_model(task, value)
            }
            ModelOutcome::Unavailable => self.heuristic(task, features),
            ModelOutcome::Failed(e) => {
                self.metrics.inc_invocation_failures(task);
                self.logger.log_invocation_failed(task, &e.to_string());
                self.heuristic(task, features)
            }
        };

        let elapsed = start.elapsed();
        self.metrics.observe_prediction_latency(elapsed.as_secs_f64());
        if let Some(prediction) = result.prediction {
            self.logger
                .log_prediction(task, prediction, result.used_model, elapsed.as_micros());
        }

        result
    }

    /// Run the task's cached regressor, loading it on first use
    pub fn invoke_model(&self, task: Task, features: &FeatureSet) -> ModelOutcome {
        let loader = RecordingLoader {
            inner: self.loader.as_ref(),
            metrics: &self.metrics,
            logger: &self.logger,
        };
        let Some(regressor) = self.cache.get_or_load(task, &loader) else {
            return ModelOutcome::Unavailable;
        };

        let row = order_columns(task, features, regressor.feature_names(), self.column_order);
        let start = Instant::now();
        let outcome = regressor.predict(&row);
        self.metrics
            .observe_model_inference(task, start.elapsed().as_secs_f64());

        match outcome {
            Ok(value) => ModelOutcome::Predicted(value),
            Err(e) => ModelOutcome::Failed(e),
        }
    }

    fn heuristic(&self, task: Task, features: &FeatureSet) -> PredictionResult {
        self.metrics.inc_predictions(task, PredictionSource::Heuristic);
        PredictionResult::from_heuristic(task, HeuristicPredictor::predict(task, features))
    }

    /// Attempt artifact loads for every task up front, returning how many loaded
    pub fn warm_up(&self) -> usize {
        let loaded = Task::ALL
            .into_iter()
            .filter(|task| {
                let loader = RecordingLoader {
                    inner: self.loader.as_ref(),
                    metrics: &self.metrics,
                    logger: &self.logger,
                };
                self.cache.get_or_load(*task, &loader).is_some()
            })
            .count();
        info!(loaded = loaded, total = Task::ALL.len(), "Artifact warm-up complete");
        loaded
    }

    /// Describe every task with its defaults and artifact status
    pub fn task_catalog(&self) -> Vec<TaskDescription> {
        Task::ALL
            .into_iter()
            .map(|task| TaskDescription {
                task,
                artifact: task.artifact_name().to_string(),
                defaults: task
                    .feature_defaults()
                    .iter()
                    .map(|(name, default)| FeatureDefault {
                        name: name.to_string(),
                        default: *default,
                    })
                    .collect(),
                status: self.cache.status(task),
            })
            .collect()
    }
}

/// Loader adapter recording load outcomes in metrics and logs
struct RecordingLoader<'a> {
    inner: &'a dyn ArtifactLoader,
    metrics: &'a ResolverMetrics,
    logger: &'a StructuredLogger,
}

impl ArtifactLoader for RecordingLoader<'_> {
    fn load(&self, task: Task) -> Result<Arc<dyn Regressor>, ArtifactError> {
        let result = self.inner.load(task);
        match &result {
            Ok(regressor) => {
                self.metrics.inc_artifact_loads(task, "loaded");
                self.logger.log_artifact_loaded(
                    task,
                    regressor.version(),
                    regressor.feature_names().is_some(),
                );
            }
            Err(e) => {
                let outcome = if e.is_missing() { "missing" } else { "failed" };
                self.metrics.inc_artifact_loads(task, outcome);
                self.logger
                    .log_artifact_unavailable(task, &e.to_string(), e.is_missing());
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::inference::tests::LINEAR3_ONNX;
    use crate::store::{compute_checksum, FsModelStore};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Regressor computing `sum(row[i] * 10^(n-1-i))`, so column order is observable
    struct PositionalRegressor {
        names: Option<Vec<String>>,
    }

    impl Regressor for PositionalRegressor {
        fn feature_names(&self) -> Option<&[String]> {
            self.names.as_deref()
        }
        fn version(&self) -> &str {
            "positional"
        }
        fn predict(&self, row: &[f32]) -> Result<f64, InferenceError> {
            if row.is_empty() {
                return Err(InferenceError::ColumnMismatch {
                    expected: 1,
                    actual: 0,
                });
            }
            Ok(row.iter().fold(0.0, |acc, v| acc * 10.0 + *v as f64))
        }
    }

    struct FailingRegressor;

    impl Regressor for FailingRegressor {
        fn feature_names(&self) -> Option<&[String]> {
            None
        }
        fn version(&self) -> &str {
            "broken"
        }
        fn predict(&self, row: &[f32]) -> Result<f64, InferenceError> {
            Err(InferenceError::ColumnMismatch {
                expected: 7,
                actual: row.len(),
            })
        }
    }

    enum Artifact {
        Positional(Option<Vec<&'static str>>),
        Failing,
    }

    #[derive(Default)]
    struct FakeStore {
        artifacts: HashMap<Task, Artifact>,
        loads: Mutex<HashMap<Task, usize>>,
        total: AtomicUsize,
    }

    impl FakeStore {
        fn with(mut self, task: Task, artifact: Artifact) -> Self {
            self.artifacts.insert(task, artifact);
            self
        }

        fn loads(&self, task: Task) -> usize {
            self.loads.lock().unwrap().get(&task).copied().unwrap_or(0)
        }
    }

    impl ArtifactLoader for FakeStore {
        fn load(&self, task: Task) -> Result<Arc<dyn Regressor>, ArtifactError> {
            self.total.fetch_add(1, Ordering::SeqCst);
            *self.loads.lock().unwrap().entry(task).or_default() += 1;
            match self.artifacts.get(&task) {
                Some(Artifact::Positional(names)) => Ok(Arc::new(PositionalRegressor {
                    names: names
                        .as_ref()
                        .map(|n| n.iter().map(|s| s.to_string()).collect()),
                })),
                Some(Artifact::Failing) => Ok(Arc::new(FailingRegressor)),
                None => Err(ArtifactError::NotFound {
                    path: PathBuf::from(task.artifact_name()),
                }),
            }
        }
    }

    fn features(pairs: &[(&str, f64)]) -> FeatureSet {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn resolver(store: Arc<FakeStore>, order: ColumnOrder) -> PredictionResolver {
        PredictionResolver::new(store, order)
    }

    #[test]
    fn test_every_task_resolves_with_empty_features() {
        let store = Arc::new(FakeStore::default());
        let resolver = resolver(store, ColumnOrder::SortedKeys);

        for task in Task::ALL {
            let result = resolver.resolve(task.as_str(), &FeatureSet::new());
            assert_eq!(result.task, task.as_str());
            assert!(result.prediction.is_some(), "{task} had no prediction");
            assert!(result.error.is_none());
            assert!(!result.used_model);
        }
    }

    #[test]
    fn test_unknown_task_result() {
        let store = Arc::new(FakeStore::default());
        let resolver = resolver(store.clone(), ColumnOrder::SortedKeys);

        let result = resolver.resolve("soil_ph", &features(&[("ph", 6.5)]));
        assert_eq!(result, PredictionResult::unknown_task("soil_ph"));
        assert_eq!(store.total.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_model_used_with_trained_names() {
        let store = Arc::new(
            FakeStore::default().with(
                Task::CropPrice,
                Artifact::Positional(Some(vec!["avg_yield", "month", "demand_index"])),
            ),
        );
        let resolver = resolver(store, ColumnOrder::SortedKeys);

        let result = resolver.resolve(
            "crop_price",
            &features(&[("month", 3.0), ("demand_index", 2.0), ("avg_yield", 1.0)]),
        );
        assert!(result.used_model);
        assert_eq!(result.prediction, Some(132.0));
    }

    #[test]
    fn test_model_missing_trained_feature_is_zero() {
        let store = Arc::new(FakeStore::default().with(
            Task::FertilizerNeed,
            Artifact::Positional(Some(vec!["crop_stage", "nitrogen_deficit_kg"])),
        ));
        let resolver = resolver(store, ColumnOrder::SortedKeys);

        let result = resolver.resolve("fertilizer_need", &features(&[("crop_stage", 4.0)]));
        assert!(result.used_model);
        assert_eq!(result.prediction, Some(40.0));
    }

    #[test]
    fn test_model_without_names_uses_sorted_keys() {
        let store = Arc::new(FakeStore::default().with(Task::Yield, Artifact::Positional(None)));
        let resolver = resolver(store, ColumnOrder::SortedKeys);

        // fertilizer_kg_per_ha < rainfall_mm < soil_index
        let result = resolver.resolve(
            "yield",
            &features(&[("soil_index", 3.0), ("rainfall_mm", 2.0), ("fertilizer_kg_per_ha", 1.0)]),
        );
        assert!(result.used_model);
        assert_eq!(result.prediction, Some(123.0));
    }

    #[test]
    fn test_model_without_names_uses_canonical_order() {
        let store = Arc::new(FakeStore::default().with(Task::Yield, Artifact::Positional(None)));
        let resolver = resolver(store, ColumnOrder::Canonical);

        // rainfall_mm, fertilizer_kg_per_ha, soil_index
        let result = resolver.resolve(
            "yield",
            &features(&[("soil_index", 3.0), ("rainfall_mm", 2.0), ("fertilizer_kg_per_ha", 1.0)]),
        );
        assert!(result.used_model);
        assert_eq!(result.prediction, Some(213.0));
    }

    #[test]
    fn test_invocation_failure_falls_back_to_heuristic() {
        let store = Arc::new(FakeStore::default().with(Task::RainfallRisk, Artifact::Failing));
        let resolver = resolver(store, ColumnOrder::SortedKeys);
        let input = features(&[("recent_7days_mm", 250.0)]);

        assert!(matches!(
            resolver.invoke_model(Task::RainfallRisk, &input),
            ModelOutcome::Failed(InferenceError::ColumnMismatch { expected: 7, actual: 1 })
        ));

        let result = resolver.resolve("rainfall_risk", &input);
        assert!(!result.used_model);
        assert_eq!(result.prediction, Some(0.99));
    }

    #[test]
    fn test_empty_features_with_unnamed_model_fall_back() {
        let store = Arc::new(FakeStore::default().with(Task::PestRisk, Artifact::Positional(None)));
        let resolver = resolver(store, ColumnOrder::SortedKeys);

        let result = resolver.resolve("pest_risk", &FeatureSet::new());
        assert!(!result.used_model);
        assert_eq!(result.prediction, Some(0.48));
    }

    #[test]
    fn test_load_outcome_cached_across_resolves() {
        let store = Arc::new(FakeStore::default().with(Task::Yield, Artifact::Positional(None)));
        let resolver = resolver(store.clone(), ColumnOrder::SortedKeys);

        for _ in 0..4 {
            resolver.resolve("yield", &features(&[("rainfall_mm", 1.0)]));
            resolver.resolve("pest_risk", &FeatureSet::new());
        }

        assert_eq!(store.loads(Task::Yield), 1);
        assert_eq!(store.loads(Task::PestRisk), 1);
        assert_eq!(store.loads(Task::CropPrice), 0);
        assert_eq!(resolver.cache().load_attempts(), 2);
    }

    #[test]
    fn test_concurrent_resolves_load_once() {
        let store = Arc::new(FakeStore::default().with(Task::CropPrice, Artifact::Positional(None)));
        let resolver = Arc::new(resolver(store.clone(), ColumnOrder::SortedKeys));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let resolver = resolver.clone();
                std::thread::spawn(move || resolver.resolve("crop_price", &features(&[("month", 4.0)])))
            })
            .collect();

        for handle in handles {
            let result = handle.join().unwrap();
            assert!(result.used_model);
            assert_eq!(result.prediction, Some(4.0));
        }
        assert_eq!(store.loads(Task::CropPrice), 1);
    }

    #[test]
    fn test_warm_up_and_catalog() {
        let store = Arc::new(FakeStore::default().with(Task::Yield, Artifact::Positional(None)));
        let resolver = resolver(store.clone(), ColumnOrder::SortedKeys);

        let before = resolver.task_catalog();
        assert!(before.iter().all(|d| d.status == ArtifactStatus::NotLoaded));

        assert_eq!(resolver.warm_up(), 1);
        assert_eq!(store.total.load(Ordering::SeqCst), 5);

        let after = resolver.task_catalog();
        let yield_entry = after.iter().find(|d| d.task == Task::Yield).unwrap();
        assert_eq!(yield_entry.status, ArtifactStatus::Loaded);
        assert_eq!(yield_entry.artifact, "yield_model");
        assert_eq!(yield_entry.defaults[0].name, "rainfall_mm");
        assert_eq!(yield_entry.defaults[0].default, 500.0);
        assert!(after
            .iter()
            .filter(|d| d.task != Task::Yield)
            .all(|d| d.status == ArtifactStatus::Unavailable));

        // Warm-up results are reused
        resolver.resolve("yield", &features(&[("rainfall_mm", 1.0)]));
        assert_eq!(store.total.load(Ordering::SeqCst), 5);
    }

    fn onnx_store(manifest: Option<serde_json::Value>) -> (TempDir, FsModelStore) {
        let dir = TempDir::new().unwrap();
        let store = FsModelStore::new(dir.path());
        std::fs::write(store.artifact_path(Task::Yield), LINEAR3_ONNX).unwrap();
        if let Some(manifest) = manifest {
            std::fs::write(store.manifest_path(Task::Yield), manifest.to_string()).unwrap();
        }
        (dir, store)
    }

    #[test]
    fn test_onnx_artifact_on_disk_is_used() {
        let (_dir, store) = onnx_store(None);
        let resolver = PredictionResolver::new(Arc::new(store), ColumnOrder::SortedKeys);

        // fertilizer_kg_per_ha, rainfall_mm, soil_index
        let result = resolver.resolve(
            "yield",
            &features(&[("soil_index", 3.0), ("rainfall_mm", 2.0), ("fertilizer_kg_per_ha", 1.0)]),
        );
        assert!(result.used_model);
        assert_eq!(result.prediction, Some(123.0));
        assert_eq!(resolver.cache().status(Task::Yield), ArtifactStatus::Loaded);
    }

    #[test]
    fn test_onnx_manifest_names_order_columns() {
        let (_dir, store) = onnx_store(Some(serde_json::json!({
            "feature_names": ["soil_index", "fertilizer_kg_per_ha", "rainfall_mm"],
            "version": "2024-06",
            "sha256": compute_checksum(LINEAR3_ONNX),
        })));
        let resolver = PredictionResolver::new(Arc::new(store), ColumnOrder::SortedKeys);

        let result = resolver.resolve(
            "yield",
            &features(&[("soil_index", 3.0), ("rainfall_mm", 2.0), ("fertilizer_kg_per_ha", 1.0)]),
        );
        assert!(result.used_model);
        assert_eq!(result.prediction, Some(312.0));

        // Missing trained feature becomes 0, extra keys are ignored
        let result = resolver.resolve(
            "yield",
            &features(&[("soil_index", 4.0), ("rainfall_mm", 5.0), ("humidity", 9.0)]),
        );
        assert_eq!(result.prediction, Some(405.0));
    }

    #[test]
    fn test_onnx_column_count_mismatch_falls_back() {
        let (_dir, store) = onnx_store(None);
        let resolver = PredictionResolver::new(Arc::new(store), ColumnOrder::SortedKeys);

        let inputs = [
            FeatureSet::new(),
            features(&[("rainfall_mm", 2.0)]),
            features(&[("rainfall_mm", 2.0), ("soil_index", 3.0)]),
            features(&[
                ("rainfall_mm", 2.0),
                ("soil_index", 3.0),
                ("fertilizer_kg_per_ha", 1.0),
                ("humidity", 70.0),
            ]),
        ];
        for input in inputs {
            assert!(matches!(
                resolver.invoke_model(Task::Yield, &input),
                ModelOutcome::Failed(_)
            ));
            let result = resolver.resolve("yield", &input);
            assert!(!result.used_model, "{} columns", input.len());
            assert_eq!(
                result.prediction,
                Some(HeuristicPredictor::predict(Task::Yield, &input))
            );
        }
    }

    #[test]
    fn test_onnx_checksum_mismatch_falls_back() {
        let (_dir, store) = onnx_store(Some(serde_json::json!({ "sha256": "00ff" })));
        let resolver = PredictionResolver::new(Arc::new(store), ColumnOrder::SortedKeys);

        let result = resolver.resolve("yield", &FeatureSet::new());
        assert!(!result.used_model);
        assert_eq!(result.prediction, Some(2.0));
        assert_eq!(resolver.cache().status(Task::Yield), ArtifactStatus::Unavailable);
    }

    #[test]
    fn test_corrupt_artifact_on_disk_falls_back() {
        let dir = TempDir::new().unwrap();
        let store = FsModelStore::new(dir.path());
        std::fs::write(store.artifact_path(Task::CropPrice), b"not an onnx graph").unwrap();
        let resolver = PredictionResolver::new(Arc::new(store), ColumnOrder::SortedKeys);

        let result = resolver.resolve(
            "crop_price",
            &features(&[("month", 6.0), ("demand_index", 1.0), ("avg_yield", 1.0)]),
        );
        assert!(!result.used_model);
        assert_eq!(result.prediction, Some(160.0));
        assert_eq!(resolver.cache().status(Task::CropPrice), ArtifactStatus::Unavailable);
    }
}
