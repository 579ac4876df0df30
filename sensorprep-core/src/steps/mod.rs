//! The five preprocessing steps.
//!
//! Every step takes the current table by reference and returns a new one, so
//! the pipeline can keep the previous value when a step is discarded.

pub mod coerce;
pub mod encode;
pub mod impute;
pub mod normalize;
pub mod oversample;
pub mod smote;

pub use coerce::to_datetime;
pub use encode::remap_label;
pub use impute::prune_and_impute;
pub use normalize::min_max_scale;
pub use oversample::{OversampleError, balance_classes};

use crate::data::DataBatch;
use crate::diagnostics::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the binary label column.
pub const LABEL_COLUMN: &str = "Pass_Fail";

/// Substring that marks a column as a sensor feature.
pub const SENSOR_MARKER: &str = "Sensor";

/// Sensor columns with |r| below this are drop candidates.
pub const MIN_ABS_CORRELATION: f64 = 0.05;

/// Sensor columns missing more than this fraction are drop candidates.
pub const MAX_MISSING_FRACTION: f64 = 0.10;

/// Seed for the oversampler's random source.
pub const SMOTE_SEED: u64 = 42;

/// Upper bound on SMOTE's neighbour count.
pub const MAX_SMOTE_NEIGHBORS: usize = 5;

/// Identifies one of the pipeline's steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    ToDatetime,
    PruneImpute,
    EncodeLabel,
    Oversample,
    Normalize,
}

impl Step {
    /// Execution order; never changes with the selection.
    pub const ORDER: [Step; 5] = [
        Step::ToDatetime,
        Step::PruneImpute,
        Step::EncodeLabel,
        Step::Oversample,
        Step::Normalize,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ToDatetime => "to_datetime",
            Self::PruneImpute => "prune_impute",
            Self::EncodeLabel => "encode_label",
            Self::Oversample => "oversample",
            Self::Normalize => "normalize",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::ToDatetime => "1. Convert time column to datetime",
            Self::PruneImpute => "2. Drop columns by correlation + missing rate, fill with mean",
            Self::EncodeLabel => "3. Encode Pass_Fail (-1 -> 0, 1 -> 1)",
            Self::Oversample => "4. Balance classes with SMOTE",
            Self::Normalize => "5. Normalize (min-max)",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sensor-column predicate: name contains the marker and is not the excluded
/// (label) column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelector {
    marker: String,
    exclude: String,
}

impl ColumnSelector {
    pub fn new(marker: impl Into<String>, exclude: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            exclude: exclude.into(),
        }
    }

    /// `Sensor` columns, never `Pass_Fail`.
    pub fn sensors() -> Self {
        Self::new(SENSOR_MARKER, LABEL_COLUMN)
    }

    pub fn matches(&self, name: &str) -> bool {
        name.contains(self.marker.as_str()) && name != self.exclude
    }

    /// Matching column names, in table order.
    pub fn select(&self, batch: &DataBatch) -> Vec<String> {
        batch
            .column_names()
            .into_iter()
            .filter(|n| self.matches(n))
            .map(str::to_string)
            .collect()
    }
}

impl Default for ColumnSelector {
    fn default() -> Self {
        Self::sensors()
    }
}

/// A step's resulting table plus anything it wants shown to the user.
#[derive(Debug, Clone)]
pub struct StepOutput {
    pub batch: DataBatch,
    pub diagnostics: Vec<Diagnostic>,
}

impl StepOutput {
    pub fn new(batch: DataBatch) -> Self {
        Self {
            batch,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_diagnostic(mut self, diagnostic: Diagnostic) -> Self {
        self.diagnostics.push(diagnostic);
        self
    }
}
