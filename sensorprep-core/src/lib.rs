//! # sensorprep-core
//!
//! Preprocessing for tabular sensor datasets. A CSV file is loaded into a typed
//! columnar [`DataBatch`], a [`TransformPipeline`] applies the selected steps in
//! a fixed order, and the result is exported as UTF-8 CSV with a byte-order mark.
//!
//! ## Steps
//!
//! 1. **To datetime**: parse a chosen column as timestamps.
//! 2. **Prune + impute**: drop sensor columns that are both weakly correlated
//!    with `Pass_Fail` and sparse, then mean-fill numeric gaps.
//! 3. **Encode label**: map `Pass_Fail` from {-1, 1} to {0, 1}.
//! 4. **Oversample**: balance `Pass_Fail` with SMOTE.
//! 5. **Normalize**: min-max scale sensor columns into [0, 1].
//!
//! Steps 2 to 4 need the label column and are skipped without it. Oversampling
//! failures are reported as diagnostics and never abort a run.

pub mod config;
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod pipeline;
pub mod steps;

// Re-exports
pub use config::{PrepConfig, load_config};
pub use data::{Column, ColumnType, ColumnValues, CsvSource, DataBatch};
pub use diagnostics::{Diagnostic, Level};
pub use error::PrepError;
pub use pipeline::{RunOutcome, TransformPipeline, TransformSelection};
pub use steps::{LABEL_COLUMN, SENSOR_MARKER, Step};
