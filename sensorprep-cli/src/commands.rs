//! CLI subcommand handlers.

use crate::Commands;
use crate::ConfigAction;
use sensorprep_core::config::{WORKSPACE_CONFIG_FILE, to_toml};
use sensorprep_core::{CsvSource, PrepConfig};
use std::path::Path;

/// Handle a CLI subcommand.
pub fn handle_command(
    command: Commands,
    workspace: &Path,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    match command {
        Commands::Columns { input } => handle_columns(&input, workspace, config_path),
        Commands::Config { action } => handle_config(action, workspace, config_path),
    }
}

fn handle_columns(input: &Path, workspace: &Path, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = sensorprep_core::load_config(Some(workspace), config_path, None)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    let batch = CsvSource::new(input)
        .with_delimiter(config.input.delimiter_byte()?)
        .load()
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", input.display(), e))?;

    let schema = batch.schema();
    let width = schema
        .columns
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(0);
    for column in &schema.columns {
        let missing = batch
            .column(&column.name)
            .map_or(0, |c| c.values.missing_count());
        println!(
            "{:<width$}  {:<8}  {} missing",
            column.name,
            column.dtype.to_string(),
            missing
        );
    }
    println!("{} rows x {} columns", batch.row_count(), batch.column_count());
    Ok(())
}

fn handle_config(
    action: ConfigAction,
    workspace: &Path,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = workspace.join(WORKSPACE_CONFIG_FILE);
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let toml_str = to_toml(&PrepConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = sensorprep_core::load_config(Some(workspace), config_path, None)
                .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
            println!("{}", to_toml(&config)?);
            Ok(())
        }
    }
}
