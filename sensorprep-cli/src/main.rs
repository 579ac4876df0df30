//! sensorprep CLI: preprocess a sensor CSV file from the terminal.
//!
//! Each preprocessing step is a flag; the result is written as
//! `preprocessed_data.csv` unless told otherwise.

mod commands;
mod run;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// sensorprep: clean, balance and scale sensor datasets
#[derive(Parser, Debug)]
#[command(name = "sensorprep", version, about, long_about = None)]
struct Cli {
    /// CSV file to preprocess (does nothing if omitted)
    input: Option<PathBuf>,

    /// Output file or directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Parse a column as timestamps (the first column unless --time-column is given)
    #[arg(long)]
    to_datetime: bool,

    /// Column to parse as timestamps; implies --to-datetime
    #[arg(long, value_name = "COL")]
    time_column: Option<String>,

    /// Drop weakly correlated sparse sensors, then fill gaps with column means
    #[arg(long)]
    impute: bool,

    /// Map Pass_Fail from {-1, 1} to {0, 1}
    #[arg(long)]
    encode_label: bool,

    /// Balance Pass_Fail classes with SMOTE
    #[arg(long)]
    oversample: bool,

    /// Min-max scale sensor columns into [0, 1]
    #[arg(long)]
    normalize: bool,

    /// Enable every step
    #[arg(long)]
    all: bool,

    /// Write the run's messages as JSON to this file
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Workspace directory
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List the columns of a CSV file with their inferred types
    Columns {
        /// CSV file to inspect
        input: PathBuf,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Write a default sensorprep.toml into the workspace
    Init,
    /// Show the effective configuration
    Show,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "sensorprep", "sensorprep")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "sensorprep.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    // Resolve workspace
    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    if let Some(command) = cli.command {
        return commands::handle_command(command, &workspace, cli.config.as_deref());
    }

    let mut config =
        sensorprep_core::load_config(Some(&workspace), cli.config.as_deref(), None)
            .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    // Step flags on the command line replace the configured selection.
    if let Some(selection) = run::selection_from_flags(&cli) {
        config.steps = selection;
    }

    run::run(&cli, &config, &workspace)
}
