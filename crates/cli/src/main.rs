//! AgriSage CLI
//!
//! A command-line tool for requesting agricultural predictions from the
//! AgriSage server or resolving them locally against a model directory.

mod client;
mod commands;
mod config;
mod output;

use agrisage_lib::ColumnOrder;
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use commands::{health, predict, publish, tasks};
use std::path::PathBuf;

/// AgriSage prediction CLI
#[derive(Parser)]
#[command(name = "agrisage")]
#[command(author, version, about = "CLI for the AgriSage prediction service", long_about = None)]
pub struct Cli {
    /// API endpoint URL (falls back to ~/.config/agrisage/config.json)
    #[arg(long, env = "AGRISAGE_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Request a prediction from the server
    Predict {
        /// Task to predict (crop_price, yield, pest_risk, fertilizer_need, rainfall_risk)
        task: String,

        /// Feature as name=value; repeat for more
        #[arg(long = "feature", short = 'f')]
        features: Vec<String>,
    },

    /// Resolve a prediction locally without a server
    Local {
        /// Task to predict
        task: String,

        /// Feature as name=value; repeat for more
        #[arg(long = "feature", short = 'f')]
        features: Vec<String>,

        /// Directory holding the ONNX artifacts
        #[arg(long)]
        model_dir: Option<PathBuf>,

        /// Column order for artifacts without recorded feature names
        #[arg(long, default_value = "sorted-keys")]
        column_order: ColumnOrderArg,
    },

    /// Install an exported ONNX model and write its manifest
    Publish {
        /// Task the model predicts
        task: String,

        /// Exported ONNX file taking the task's features in catalog order
        model: PathBuf,

        /// Directory holding the ONNX artifacts
        #[arg(long)]
        model_dir: Option<PathBuf>,

        /// Version label recorded in the manifest
        #[arg(long = "model-version")]
        model_version: Option<String>,
    },

    /// List tasks, their feature defaults and model status
    Tasks,

    /// Show server health
    Health,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColumnOrderArg {
    SortedKeys,
    Canonical,
}

impl From<ColumnOrderArg> for ColumnOrder {
    fn from(arg: ColumnOrderArg) -> Self {
        match arg {
            ColumnOrderArg::SortedKeys => ColumnOrder::SortedKeys,
            ColumnOrderArg::Canonical => ColumnOrder::Canonical,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load()?;

    match cli.command {
        Commands::Predict { task, features } => {
            let client = client::ApiClient::new(&config.api_url(cli.api_url))?;
            predict::predict_remote(&client, &task, &features, cli.format).await?;
        }
        Commands::Local {
            task,
            features,
            model_dir,
            column_order,
        } => {
            let model_dir = model_dir
                .or(config.model_dir)
                .unwrap_or_else(|| PathBuf::from("models"));
            predict::predict_local(&task, &features, model_dir, column_order.into(), cli.format)?;
        }
        Commands::Publish {
            task,
            model,
            model_dir,
            model_version,
        } => {
            let model_dir = model_dir
                .or(config.model_dir)
                .unwrap_or_else(|| PathBuf::from("models"));
            publish::publish(&task, &model, &model_dir, model_version, cli.format)?;
        }
        Commands::Tasks => {
            let client = client::ApiClient::new(&config.api_url(cli.api_url))?;
            tasks::list_tasks(&client, cli.format).await?;
        }
        Commands::Health => {
            let client = client::ApiClient::new(&config.api_url(cli.api_url))?;
            health::show_health(&client, cli.format).await?;
        }
    }

    Ok(())
}
