//! Task catalog command

use anyhow::Result;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{color_artifact_status, print_json, OutputFormat};

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "Task")]
    task: String,
    #[tabled(rename = "Artifact")]
    artifact: String,
    #[tabled(rename = "Features (default)")]
    defaults: String,
    #[tabled(rename = "Model")]
    status: String,
}

/// List the server's tasks with their feature defaults
pub async fn list_tasks(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let tasks = client.tasks().await?;

    match format {
        OutputFormat::Json => print_json(&tasks)?,
        OutputFormat::Table => {
            let rows: Vec<TaskRow> = tasks
                .iter()
                .map(|t| TaskRow {
                    task: t.task.to_string(),
                    artifact: format!("{}.onnx", t.artifact),
                    defaults: t
                        .defaults
                        .iter()
                        .map(|d| format!("{} ({})", d.name, d.default))
                        .collect::<Vec<_>>()
                        .join("\n"),
                    status: color_artifact_status(t.status),
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
        }
    }

    Ok(())
}
