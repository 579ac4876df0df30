//! Step 4: balance the label with SMOTE.

use crate::data::{Column, ColumnValues, DataBatch};
use crate::steps::smote::Smote;
use crate::steps::{MAX_SMOTE_NEIGHBORS, SMOTE_SEED};
use std::collections::BTreeMap;
use thiserror::Error;

/// Why oversampling did not produce a table. None of these are fatal for the
/// run; the pipeline keeps the table it had before the step.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OversampleError {
    /// Raised before SMOTE runs; reported as a warning rather than an error.
    #[error("minority class too small (min class: {min_class})")]
    MinorityTooSmall { min_class: usize },

    #[error("cannot convert label '{label}' to integer: {reason}")]
    Label { label: String, reason: String },

    #[error("input contains missing values in feature column '{0}'")]
    MissingFeature(String),

    #[error("input contains non-finite feature values")]
    NonFinite,

    #[error("no numeric feature columns to resample")]
    NoFeatures,

    #[error("cannot resample an empty table")]
    Empty,

    #[error("target needs more than one class, found {0}")]
    SingleClass(usize),

    #[error("expected k_neighbors < class size, got k_neighbors = {k} and class size = {class_size}")]
    Neighbors { k: usize, class_size: usize },

    #[error("shape mismatch: {0}")]
    Shape(String),
}

impl OversampleError {
    /// Precondition failures are shown as warnings, the rest as errors.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::MinorityTooSmall { .. })
    }
}

/// Result of a successful oversampling pass.
#[derive(Debug, Clone)]
pub struct Oversampled {
    pub batch: DataBatch,
    pub class_counts_before: BTreeMap<i64, usize>,
    pub class_counts_after: BTreeMap<i64, usize>,
    pub k_neighbors: usize,
}

/// Coerce the label column to integers the way a dtype cast would: floats
/// truncate, missing or non-numeric values fail.
pub fn label_as_int(col: &Column) -> Result<Vec<i64>, OversampleError> {
    let fail = |reason: &str| OversampleError::Label {
        label: col.name.clone(),
        reason: reason.to_string(),
    };
    match &col.values {
        ColumnValues::Integer(v) => v
            .iter()
            .map(|c| c.ok_or_else(|| fail("missing values cannot be converted")))
            .collect(),
        ColumnValues::Float(v) => v
            .iter()
            .map(|c| match c {
                Some(f) if f.is_finite() => Ok(f.trunc() as i64),
                _ => Err(fail("missing or non-finite values cannot be converted")),
            })
            .collect(),
        ColumnValues::String(_) | ColumnValues::DateTime(_) => {
            Err(fail(&format!("column has type {}", col.dtype())))
        }
    }
}

fn class_counts(y: &[i64]) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for &c in y {
        *counts.entry(c).or_insert(0) += 1;
    }
    counts
}

/// Oversample every minority class of `label` up to the majority count.
///
/// The output holds the numeric feature columns (in their original order and
/// type) followed by the label. Other columns are dropped.
/// `Ok(None)` means the label column is absent and the step does not apply.
pub fn balance_classes(
    batch: &DataBatch,
    label: &str,
) -> Result<Option<Oversampled>, OversampleError> {
    let Some(label_col) = batch.column(label) else {
        tracing::debug!(label, "No label column; skipping oversampling");
        return Ok(None);
    };

    let features: Vec<&Column> = batch
        .columns()
        .iter()
        .filter(|c| c.name != label && c.dtype().is_numeric())
        .collect();
    let y = label_as_int(label_col)?;

    let before = class_counts(&y);
    let min_class = before.values().copied().min().ok_or(OversampleError::Empty)?;
    if min_class <= 1 {
        return Err(OversampleError::MinorityTooSmall { min_class });
    }
    if features.is_empty() {
        return Err(OversampleError::NoFeatures);
    }

    let mut x = vec![Vec::with_capacity(features.len()); y.len()];
    for col in &features {
        let values = col.values.as_f64().ok_or(OversampleError::NoFeatures)?;
        for (row, cell) in values.into_iter().enumerate() {
            let v = cell.ok_or_else(|| OversampleError::MissingFeature(col.name.clone()))?;
            x[row].push(v);
        }
    }

    let k = (min_class - 1).min(MAX_SMOTE_NEIGHBORS);
    let resampled = Smote::new(k).with_seed(SMOTE_SEED).fit_resample(&x, &y)?;

    let mut columns: Vec<Column> = features
        .iter()
        .enumerate()
        .map(|(j, col)| {
            let values = match col.values {
                // Synthetic points between integers truncate, as a dtype cast would.
                ColumnValues::Integer(_) => ColumnValues::Integer(
                    resampled.x.iter().map(|row| Some(row[j].trunc() as i64)).collect(),
                ),
                _ => ColumnValues::Float(resampled.x.iter().map(|row| Some(row[j])).collect()),
            };
            Column::new(col.name.clone(), values)
        })
        .collect();
    columns.push(Column::new(
        label,
        ColumnValues::Integer(resampled.y.iter().copied().map(Some).collect()),
    ));
    let out = DataBatch::new(columns).map_err(|e| OversampleError::Shape(e.to_string()))?;

    let after = class_counts(&resampled.y);
    tracing::info!(
        k_neighbors = k,
        rows_before = batch.row_count(),
        rows_after = out.row_count(),
        "Applied SMOTE"
    );

    Ok(Some(Oversampled {
        batch: out,
        class_counts_before: before,
        class_counts_after: after,
        k_neighbors: k,
    }))
}
