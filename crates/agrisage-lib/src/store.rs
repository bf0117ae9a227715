//! Filesystem model store
//!
//! One ONNX artifact per task, named after [`Task::artifact_name`], with an
//! optional JSON manifest beside it:
//!
//! ```text
//! models/
//!   crop_price.onnx
//!   crop_price.manifest.json   {"feature_names": [...], "version": "...", "sha256": "..."}
//!   yield_model.onnx
//! ```

use crate::error::ArtifactError;
use crate::models::Task;
use crate::predictor::{OnnxRegressor, Regressor};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Default artifact size limit (16 MiB)
pub const DEFAULT_MAX_ARTIFACT_BYTES: u64 = 16 * 1024 * 1024;

/// Version reported for artifacts without a manifest version
pub const UNVERSIONED: &str = "unversioned";

/// Source of trained regressors keyed by task
pub trait ArtifactLoader: Send + Sync {
    fn load(&self, task: Task) -> Result<Arc<dyn Regressor>, ArtifactError>;
}

/// Sidecar metadata recorded at training time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactManifest {
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
}

/// Where a task's artifact is expected and whether it is there
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactLocation {
    pub path: PathBuf,
    pub exists: bool,
}

/// Model store rooted at a directory
#[derive(Debug, Clone)]
pub struct FsModelStore {
    model_dir: PathBuf,
    max_artifact_bytes: u64,
}

impl FsModelStore {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            max_artifact_bytes: DEFAULT_MAX_ARTIFACT_BYTES,
        }
    }

    pub fn with_max_artifact_bytes(mut self, limit: u64) -> Self {
        self.max_artifact_bytes = limit;
        self
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    pub fn artifact_path(&self, task: Task) -> PathBuf {
        self.model_dir.join(format!("{}.onnx", task.artifact_name()))
    }

    pub fn manifest_path(&self, task: Task) -> PathBuf {
        self.model_dir
            .join(format!("{}.manifest.json", task.artifact_name()))
    }

    pub fn describe(&self, task: Task) -> ArtifactLocation {
        let path = self.artifact_path(task);
        let exists = path.is_file();
        ArtifactLocation { path, exists }
    }

    fn read_manifest(&self, task: Task) -> Result<ArtifactManifest, ArtifactError> {
        let path = self.manifest_path(task);
        match fs::read(&path) {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Manifest { path, source })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(ArtifactManifest::default()),
            Err(source) => Err(ArtifactError::Io { path, source }),
        }
    }

    fn read_artifact(&self, path: &Path) -> Result<Vec<u8>, ArtifactError> {
        let metadata = match fs::metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ArtifactError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(source) => {
                return Err(ArtifactError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        if metadata.len() > self.max_artifact_bytes {
            return Err(ArtifactError::TooLarge {
                path: path.to_path_buf(),
                size: metadata.len(),
                limit: self.max_artifact_bytes,
            });
        }

        fs::read(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl ArtifactLoader for FsModelStore {
    fn load(&self, task: Task) -> Result<Arc<dyn Regressor>, ArtifactError> {
        let path = self.artifact_path(task);
        let bytes = self.read_artifact(&path)?;
        let manifest = self.read_manifest(task)?;

        if let Some(expected) = &manifest.sha256 {
            let actual = compute_checksum(&bytes);
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(ArtifactError::ChecksumMismatch {
                    path,
                    expected: expected.clone(),
                    actual,
                });
            }
            debug!(task = %task, checksum = %actual, "Artifact checksum validated");
        }

        let version = manifest.version.unwrap_or_else(|| UNVERSIONED.to_string());
        let regressor = OnnxRegressor::from_bytes(&path, &bytes, manifest.feature_names, version)?;
        Ok(Arc::new(regressor))
    }
}

/// Compute SHA256 checksum of artifact bytes
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
