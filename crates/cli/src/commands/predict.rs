//! Prediction commands

use agrisage_lib::{ColumnOrder, FsModelStore, PredictionResolver, PredictionResult};
use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::Tabled;

use super::parse_features;
use crate::client::ApiClient;
use crate::output::{format_prediction, format_source, print_json, print_warning, OutputFormat};

#[derive(Tabled)]
struct PredictionRow {
    #[tabled(rename = "Task")]
    task: String,
    #[tabled(rename = "Prediction")]
    prediction: String,
    #[tabled(rename = "Source")]
    source: String,
}

/// Request a prediction from the server
pub async fn predict_remote(
    client: &ApiClient,
    task: &str,
    features: &[String],
    format: OutputFormat,
) -> Result<()> {
    let features = parse_features(features)?;
    let result = client.predict(task, &features).await?;
    print_result(&result, format)
}

/// Resolve a prediction in-process against a local model directory
pub fn predict_local(
    task: &str,
    features: &[String],
    model_dir: PathBuf,
    column_order: ColumnOrder,
    format: OutputFormat,
) -> Result<()> {
    let features = parse_features(features)?;
    let resolver = PredictionResolver::new(Arc::new(FsModelStore::new(model_dir)), column_order);
    let result = resolver.resolve(task, &features);
    print_result(&result, format)
}

fn print_result(result: &PredictionResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(result)?,
        OutputFormat::Table => {
            if let Some(error) = &result.error {
                print_warning(&format!("{}: {}", error, result.task.bold()));
                return Ok(());
            }

            let row = PredictionRow {
                task: result.task.clone(),
                prediction: result
                    .prediction
                    .map(format_prediction)
                    .unwrap_or_else(|| "-".to_string()),
                source: format_source(result.used_model),
            };
            let table = tabled::Table::new([row])
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
        }
    }
    Ok(())
}
