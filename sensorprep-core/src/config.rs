//! Configuration for sensorprep.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> explicit config file -> environment -> CLI overrides.
//! The user file lives at `~/.config/sensorprep/config.toml`; the workspace file
//! is `sensorprep.toml` in the working directory.

use crate::data::DEFAULT_OUTPUT_NAME;
use crate::error::{PrepError, Result};
use crate::pipeline::{DEFAULT_PREVIEW_ROWS, TransformSelection};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the workspace-level config file.
pub const WORKSPACE_CONFIG_FILE: &str = "sensorprep.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrepConfig {
    /// Steps enabled when the command line does not choose any.
    #[serde(default)]
    pub steps: TransformSelection,
    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
    /// Input settings.
    #[serde(default)]
    pub input: InputConfig,
}

/// Where and how the result is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// File name used when the output path is a directory or omitted.
    #[serde(default = "default_file_name")]
    pub file_name: String,
    /// Rows shown in the before/after previews.
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file_name: default_file_name(),
            preview_rows: default_preview_rows(),
        }
    }
}

fn default_file_name() -> String {
    DEFAULT_OUTPUT_NAME.to_string()
}

fn default_preview_rows() -> usize {
    DEFAULT_PREVIEW_ROWS
}

/// How the input file is parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
        }
    }
}

fn default_delimiter() -> char {
    ','
}

impl InputConfig {
    /// The delimiter as the single byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                PrepError::config(format!(
                    "delimiter must be a single ASCII character, got {:?}",
                    self.delimiter
                ))
            })
    }
}

/// Path of the user-level config file, if a home directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "sensorprep", "sensorprep")
        .map(|d| d.config_dir().join("config.toml"))
}

/// Load configuration from all layers.
pub fn load_config(
    workspace: Option<&Path>,
    explicit: Option<&Path>,
    overrides: Option<&PrepConfig>,
) -> Result<PrepConfig> {
    let mut figment = Figment::from(Serialized::defaults(PrepConfig::default()));

    // User-level config
    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = ws.join(WORKSPACE_CONFIG_FILE);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // Explicit config file must exist
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(PrepError::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        figment = figment.merge(Toml::file(path));
    }

    // Environment variables (SENSORPREP_OUTPUT__FILE_NAME, SENSORPREP_STEPS__NORMALIZE, ...)
    figment = figment.merge(Env::prefixed("SENSORPREP_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    let config: PrepConfig = figment.extract()?;
    config.input.delimiter_byte()?;
    Ok(config)
}

/// Render a config as TOML.
pub fn to_toml(config: &PrepConfig) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| PrepError::config(e.to_string()))
}
