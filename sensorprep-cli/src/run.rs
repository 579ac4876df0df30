//! Running the pipeline over one input file.

use crate::Cli;
use anyhow::Context;
use sensorprep_core::diagnostics::Level;
use sensorprep_core::{CsvSource, PrepConfig, RunOutcome, TransformPipeline, TransformSelection};
use std::path::{Path, PathBuf};

/// The step selection given by flags, or `None` when no step flag was used.
pub(crate) fn selection_from_flags(cli: &Cli) -> Option<TransformSelection> {
    if cli.all {
        return Some(TransformSelection::all(cli.time_column.clone()));
    }
    let selection = TransformSelection {
        to_datetime: cli.to_datetime || cli.time_column.is_some(),
        time_column: cli.time_column.clone(),
        prune_impute: cli.impute,
        encode_label: cli.encode_label,
        oversample: cli.oversample,
        normalize: cli.normalize,
    };
    if selection.enabled_steps().is_empty() {
        None
    } else {
        Some(selection)
    }
}

/// Where the result goes: `-o` as given, or inside it when it is a directory.
pub(crate) fn output_path(output: Option<&Path>, workspace: &Path, file_name: &str) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.join(file_name),
        Some(path) => path.to_path_buf(),
        None => workspace.join(file_name),
    }
}

/// Load, transform and export. Without an input file this only prints a notice.
pub(crate) fn run(cli: &Cli, config: &PrepConfig, workspace: &Path) -> anyhow::Result<()> {
    let pipeline =
        TransformPipeline::new(config.steps.clone()).with_preview_rows(config.output.preview_rows);

    let input = match &cli.input {
        Some(path) => {
            let source = CsvSource::new(path).with_delimiter(config.input.delimiter_byte()?);
            Some(
                source
                    .load()
                    .with_context(|| format!("Failed to read {}", path.display()))?,
            )
        }
        None => None,
    };

    let outcome = pipeline.run(input).context("Preprocessing failed")?;
    print_diagnostics(&outcome, cli.quiet);

    if let Some(report) = &cli.report {
        let json = serde_json::to_string_pretty(&outcome)?;
        std::fs::write(report, json)
            .with_context(|| format!("Failed to write report {}", report.display()))?;
        tracing::info!(path = %report.display(), "Wrote run report");
    }

    let Some(dataset) = &outcome.dataset else {
        if !cli.quiet {
            println!("No input file given; nothing to preprocess.");
        }
        return Ok(());
    };

    let path = output_path(cli.output.as_deref(), workspace, &config.output.file_name);
    sensorprep_core::data::save_csv(dataset, &path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    if !cli.quiet {
        println!("Saved {}", path.display());
    }
    Ok(())
}

fn print_diagnostics(outcome: &RunOutcome, quiet: bool) {
    for diagnostic in &outcome.diagnostics {
        match diagnostic.level {
            Level::Warning | Level::Error => eprintln!("{diagnostic}\n"),
            Level::Info | Level::Success if !quiet => println!("{diagnostic}\n"),
            Level::Info | Level::Success => {}
        }
    }
}
