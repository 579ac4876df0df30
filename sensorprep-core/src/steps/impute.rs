//! Step 2: drop weak, sparse sensor columns and mean-fill the rest.

use crate::data::stats::{mean, missing_fraction, pearson};
use crate::data::{Column, ColumnValues, DataBatch};
use crate::diagnostics::Diagnostic;
use crate::error::{PrepError, Result};
use crate::steps::{
    ColumnSelector, LABEL_COLUMN, MAX_MISSING_FRACTION, MIN_ABS_CORRELATION, Step, StepOutput,
};

/// Drop decision inputs for one sensor column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnScore {
    pub name: String,
    /// |r| with the label; `None` when undefined.
    pub abs_correlation: Option<f64>,
    pub missing_fraction: f64,
}

impl ColumnScore {
    /// Weakly correlated and too sparse. An undefined correlation never drops.
    pub fn should_drop(&self) -> bool {
        self.abs_correlation
            .is_some_and(|r| r < MIN_ABS_CORRELATION)
            && self.missing_fraction > MAX_MISSING_FRACTION
    }
}

/// Score every sensor column against the label.
pub fn score_sensors(
    batch: &DataBatch,
    label: &[Option<f64>],
    selector: &ColumnSelector,
) -> Result<Vec<ColumnScore>> {
    selector
        .select(batch)
        .into_iter()
        .map(|name| {
            let col = batch
                .column(&name)
                .ok_or_else(|| PrepError::column_not_found(&name))?;
            let values = numeric(col, Step::PruneImpute)?;
            Ok(ColumnScore {
                abs_correlation: pearson(&values, label).map(f64::abs),
                missing_fraction: missing_fraction(&col.values),
                name,
            })
        })
        .collect()
}

/// Prune sensor columns that are both uncorrelated with the label and
/// sparse, then replace missing numeric cells with their column mean.
///
/// Returns `Ok(None)` when the label column is absent or not numeric.
pub fn prune_and_impute(
    batch: &DataBatch,
    selector: &ColumnSelector,
) -> Result<Option<StepOutput>> {
    let Some(label) = batch.column(LABEL_COLUMN).and_then(|c| c.values.as_f64()) else {
        tracing::debug!("No numeric label column; skipping prune/impute");
        return Ok(None);
    };

    let scores = score_sensors(batch, &label, selector)?;
    let to_drop: Vec<String> = scores
        .iter()
        .filter(|s| s.should_drop())
        .map(|s| s.name.clone())
        .collect();
    for score in &scores {
        tracing::debug!(
            column = %score.name,
            abs_correlation = ?score.abs_correlation,
            missing_fraction = score.missing_fraction,
            "Scored sensor column"
        );
    }

    let pruned = batch.without_columns(&to_drop);
    let mut filled_cells = 0usize;
    let columns: Vec<Column> = pruned
        .into_columns()
        .into_iter()
        .map(|col| {
            let (values, filled) = fill_with_mean(col.values);
            filled_cells += filled;
            Column::new(col.name, values)
        })
        .collect();
    let batch = DataBatch::new(columns)?;

    tracing::info!(
        dropped = to_drop.len(),
        filled_cells,
        "Pruned sensor columns and filled missing values"
    );

    let dropped_msg = if to_drop.is_empty() {
        "No sensor columns dropped".to_string()
    } else {
        format!("Dropped sensor columns: {}", to_drop.join(", "))
    };
    Ok(Some(
        StepOutput::new(batch)
            .with_diagnostic(Diagnostic::info(dropped_msg).for_step(Step::PruneImpute))
            .with_diagnostic(
                Diagnostic::info(format!("Filled {filled_cells} missing values with column means"))
                    .for_step(Step::PruneImpute),
            ),
    ))
}

/// Replace missing numeric cells with the mean of the present ones.
///
/// Non-numeric and fully-missing columns pass through. An integer column that
/// receives a fill becomes a float column.
fn fill_with_mean(values: ColumnValues) -> (ColumnValues, usize) {
    let Some(floats) = values.as_f64() else {
        return (values, 0);
    };
    let missing = values.missing_count();
    let Some(m) = mean(&floats) else {
        return (values, 0);
    };
    if missing == 0 {
        return (values, 0);
    }
    let filled = floats.into_iter().map(|v| Some(v.unwrap_or(m))).collect();
    (ColumnValues::Float(filled), missing)
}

/// Numeric view of `col`, or a fatal error naming the step.
pub(crate) fn numeric(col: &Column, step: Step) -> Result<Vec<Option<f64>>> {
    col.values
        .as_f64()
        .ok_or_else(|| PrepError::NonNumericColumn {
            column: col.name.clone(),
            step: step.name(),
            found: col.dtype().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ColumnType;
    use pretty_assertions::assert_eq;

    fn batch() -> DataBatch {
        // Sensor1: r = 0 and 20% missing -> dropped.
        // Sensor2: |r| ~ 0.32, one gap -> kept and filled.
        // Sensor3: constant, correlation undefined -> kept.
        DataBatch::new(vec![
            Column::new(
                "Sensor1",
                ColumnValues::Float(vec![Some(1.0), Some(1.0), Some(2.0), Some(2.0), None]),
            ),
            Column::new(
                "Sensor2",
                ColumnValues::Float(vec![Some(1.0), Some(2.0), None, Some(4.0), Some(5.0)]),
            ),
            Column::new(
                "Sensor3",
                ColumnValues::Integer(vec![Some(3), Some(3), Some(3), Some(3), Some(3)]),
            ),
            Column::new(
                "Note",
                ColumnValues::String(vec![Some("x".into()), None, None, None, None]),
            ),
            Column::new(
                LABEL_COLUMN,
                ColumnValues::Integer(vec![Some(-1), Some(1), Some(1), Some(-1), Some(1)]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_should_drop_rules() {
        let s = |r: Option<f64>, m: f64| ColumnScore {
            name: "s".into(),
            abs_correlation: r,
            missing_fraction: m,
        };
        assert!(s(Some(0.01), 0.2).should_drop());
        assert!(!s(Some(0.01), 0.1).should_drop());
        assert!(!s(Some(0.05), 0.5).should_drop());
        assert!(!s(None, 0.9).should_drop());
    }

    #[test]
    fn test_prune_and_impute() {
        let out = prune_and_impute(&batch(), &ColumnSelector::sensors())
            .unwrap()
            .unwrap();
        let b = &out.batch;
        assert_eq!(
            b.column_names(),
            vec!["Sensor2", "Sensor3", "Note", LABEL_COLUMN]
        );
        let s2 = &b.column("Sensor2").unwrap().values;
        assert_eq!(s2.missing_count(), 0);
        assert_eq!(s2.render(2).as_deref(), Some("3.0"));
        // Complete integer columns keep their type; strings are not filled.
        assert_eq!(b.column("Sensor3").unwrap().dtype(), ColumnType::Integer);
        assert_eq!(b.column("Note").unwrap().values.missing_count(), 4);
        assert_eq!(out.diagnostics.len(), 2);
        assert!(out.diagnostics[0].message.contains("Sensor1"));
    }

    #[test]
    fn test_fills_non_sensor_columns_and_label() {
        let b = DataBatch::new(vec![
            Column::new(
                "Sensor1",
                ColumnValues::Float(vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0)]),
            ),
            Column::new(
                "Other",
                ColumnValues::Integer(vec![Some(10), None, Some(20), Some(30), Some(40)]),
            ),
            Column::new(
                LABEL_COLUMN,
                ColumnValues::Integer(vec![Some(-1), Some(1), None, Some(-1), Some(1)]),
            ),
        ])
        .unwrap();
        let out = prune_and_impute(&b, &ColumnSelector::sensors())
            .unwrap()
            .unwrap();

        let other = &out.batch.column("Other").unwrap().values;
        assert_eq!(
            other,
            &ColumnValues::Float(vec![Some(10.0), Some(25.0), Some(20.0), Some(30.0), Some(40.0)])
        );
        let label = out.batch.column(LABEL_COLUMN).unwrap();
        assert_eq!(label.dtype(), ColumnType::Float);
        assert_eq!(label.values.render(2).as_deref(), Some("0.0"));
        assert_eq!(
            out.diagnostics[1].message,
            "Filled 2 missing values with column means"
        );
    }

    #[test]
    fn test_integer_column_with_gap_becomes_float() {
        let (values, filled) = fill_with_mean(ColumnValues::Integer(vec![Some(1), None, Some(2)]));
        assert_eq!(filled, 1);
        assert_eq!(values, ColumnValues::Float(vec![Some(1.0), Some(1.5), Some(2.0)]));

        let (values, filled) = fill_with_mean(ColumnValues::Integer(vec![Some(1), Some(2)]));
        assert_eq!(filled, 0);
        assert_eq!(values.dtype(), ColumnType::Integer);
    }

    #[test]
    fn test_skipped_without_label() {
        let b = batch().without_columns(&[LABEL_COLUMN.to_string()]);
        assert!(prune_and_impute(&b, &ColumnSelector::sensors()).unwrap().is_none());
    }

    #[test]
    fn test_non_numeric_sensor_is_fatal() {
        let b = DataBatch::new(vec![
            Column::new("SensorText", ColumnValues::String(vec![Some("a".into())])),
            Column::new(LABEL_COLUMN, ColumnValues::Integer(vec![Some(1)])),
        ])
        .unwrap();
        assert!(matches!(
            prune_and_impute(&b, &ColumnSelector::sensors()),
            Err(PrepError::NonNumericColumn { .. })
        ));
    }

    #[test]
    fn test_all_missing_column_stays_missing() {
        let (values, filled) = fill_with_mean(ColumnValues::Float(vec![None, None]));
        assert_eq!(filled, 0);
        assert_eq!(values.missing_count(), 2);
    }
}
