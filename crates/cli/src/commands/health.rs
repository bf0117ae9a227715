//! Server health command

use anyhow::Result;
use colored::Colorize;

use crate::client::ApiClient;
use crate::output::{color_component_status, print_info, print_json, print_success, OutputFormat};
use agrisage_lib::ComponentStatus;

/// Show server health by component
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health = client.health().await?;

    match format {
        OutputFormat::Json => print_json(&health)?,
        OutputFormat::Table => {
            println!("{}", "Server Health".bold());
            println!("{}", "=".repeat(40));

            let mut names: Vec<&String> = health.components.keys().collect();
            names.sort();
            for name in names {
                let component = &health.components[name];
                print!("{:<14} {}", name, color_component_status(component.status));
                match &component.message {
                    Some(message) => println!("  {}", message.dimmed()),
                    None => println!(),
                }
            }
            println!();

            match health.status {
                ComponentStatus::Healthy => print_success("All components healthy"),
                ComponentStatus::Degraded => {
                    print_info("Serving with reduced capability (heuristic fallback active)")
                }
                ComponentStatus::Unhealthy => anyhow::bail!("Server is unhealthy"),
            }
        }
    }

    Ok(())
}
