//! Install an exported ONNX regressor into a model directory

use agrisage_lib::store::{compute_checksum, ArtifactManifest};
use agrisage_lib::{ArtifactLoader, FsModelStore, Task};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::output::{print_info, print_json, print_success, OutputFormat};

/// Copy `source` to `<model_dir>/<artifact>.onnx` and write its manifest.
///
/// The model must take the task's features in `feature_defaults()` order;
/// the manifest records those names, `version` and the artifact checksum.
/// The installed pair is loaded back once and removed again if it does
/// not load.
pub fn publish(
    task: &str,
    source: &Path,
    model_dir: &Path,
    version: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let task: Task = task.parse()?;
    let bytes = fs::read(source)
        .with_context(|| format!("Failed to read model file {}", source.display()))?;

    let manifest = ArtifactManifest {
        feature_names: Some(
            task.feature_defaults()
                .iter()
                .map(|(name, _)| name.to_string())
                .collect(),
        ),
        version,
        sha256: Some(compute_checksum(&bytes)),
    };

    fs::create_dir_all(model_dir)
        .with_context(|| format!("Failed to create model directory {}", model_dir.display()))?;
    let store = FsModelStore::new(model_dir);
    let artifact_path = store.artifact_path(task);
    let manifest_path = store.manifest_path(task);

    fs::write(&artifact_path, &bytes)
        .with_context(|| format!("Failed to write {}", artifact_path.display()))?;
    fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
        .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

    if let Err(e) = store.load(task) {
        let _ = fs::remove_file(&artifact_path);
        let _ = fs::remove_file(&manifest_path);
        return Err(anyhow::Error::new(e)
            .context(format!("{} does not load as a {} model", source.display(), task)));
    }

    match format {
        OutputFormat::Json => print_json(&manifest)?,
        OutputFormat::Table => {
            print_success(&format!("Published {} to {}", task, artifact_path.display()));
            print_info(&format!(
                "Columns: {}",
                manifest.feature_names.as_deref().unwrap_or_default().join(", ")
            ));
        }
    }

    Ok(())
}
