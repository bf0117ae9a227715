//! Output formatting utilities

use agrisage_lib::{ArtifactStatus, ComponentStatus};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a prediction value for display
pub fn format_prediction(value: f64) -> String {
    let text = format!("{:.2}", value);
    // -0.00 reads as a sign error
    if text == "-0.00" {
        "0.00".to_string()
    } else {
        text
    }
}

/// Label where a prediction came from
pub fn format_source(used_model: bool) -> String {
    if used_model {
        "model".green().to_string()
    } else {
        "heuristic".yellow().to_string()
    }
}

pub fn color_artifact_status(status: ArtifactStatus) -> String {
    match status {
        ArtifactStatus::Loaded => "loaded".green().to_string(),
        ArtifactStatus::NotLoaded => "not loaded".normal().to_string(),
        ArtifactStatus::Unavailable => "unavailable".yellow().to_string(),
    }
}

pub fn color_component_status(status: ComponentStatus) -> String {
    match status {
        ComponentStatus::Healthy => "healthy".green().to_string(),
        ComponentStatus::Degraded => "degraded".yellow().to_string(),
        ComponentStatus::Unhealthy => "unhealthy".red().to_string(),
    }
}
