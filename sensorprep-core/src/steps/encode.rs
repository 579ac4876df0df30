//! Step 3: remap the label from {-1, 1} to {0, 1}.

use crate::data::stats::value_counts;
use crate::data::{ColumnValues, DataBatch};
use crate::diagnostics::Diagnostic;
use crate::error::Result;
use crate::steps::{Step, StepOutput};

/// The label dictionary. Anything not listed has no mapping.
pub fn map_label(value: f64) -> Option<i64> {
    if value == -1.0 {
        Some(0)
    } else if value == 1.0 {
        Some(1)
    } else {
        None
    }
}

/// Remap `label`, reporting the distribution before and after.
///
/// Values outside {-1, 1} become missing and are reported in a warning.
/// Returns `Ok(None)` when the column is absent or not numeric.
pub fn remap_label(batch: &DataBatch, label: &str) -> Result<Option<StepOutput>> {
    let Some(col) = batch.column(label) else {
        tracing::debug!(label, "No label column; skipping label encoding");
        return Ok(None);
    };
    let Some(values) = col.values.as_f64() else {
        tracing::debug!(label, dtype = %col.dtype(), "Label is not numeric; skipping label encoding");
        return Ok(None);
    };

    let before = value_counts(&col.values);
    let mut unmapped = 0usize;
    let mapped: Vec<Option<i64>> = values
        .into_iter()
        .map(|v| {
            let out = v.and_then(map_label);
            if v.is_some() && out.is_none() {
                unmapped += 1;
            }
            out
        })
        .collect();
    let mapped = ColumnValues::Integer(mapped);
    let after = value_counts(&mapped);
    let batch = batch.with_values(label, mapped)?;

    tracing::info!(label, unmapped, "Encoded label column");

    let mut out = StepOutput::new(batch)
        .with_diagnostic(
            Diagnostic::distribution(format!("{label} class distribution before encoding"), before)
                .for_step(Step::EncodeLabel),
        )
        .with_diagnostic(
            Diagnostic::distribution(format!("{label} class distribution after encoding"), after)
                .for_step(Step::EncodeLabel),
        );
    if unmapped > 0 {
        out = out.with_diagnostic(
            Diagnostic::warning(format!(
                "{unmapped} {label} values outside {{-1, 1}} have no mapping and were set to missing"
            ))
            .for_step(Step::EncodeLabel),
        );
    }
    Ok(Some(out))
}
