//! Step 5: min-max scale sensor columns into [0, 1].

use crate::data::{Column, ColumnValues, DataBatch};
use crate::error::Result;
use crate::steps::impute::numeric;
use crate::steps::{ColumnSelector, Step};
use serde::{Deserialize, Serialize};

/// Fitted range of one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMax {
    pub min: f64,
    pub max: f64,
}

impl MinMax {
    /// Fit over the present values; `None` if there are none.
    pub fn fit(values: &[Option<f64>]) -> Option<Self> {
        values.iter().flatten().fold(None, |acc, &v| {
            Some(match acc {
                None => Self { min: v, max: v },
                Some(m) => Self {
                    min: m.min.min(v),
                    max: m.max.max(v),
                },
            })
        })
    }

    /// `(v - min) / (max - min)`; a constant column maps to 0.0.
    pub fn scale(&self, v: f64) -> f64 {
        let range = self.max - self.min;
        if range == 0.0 { 0.0 } else { (v - self.min) / range }
    }
}

/// Scale every sensor column independently. Missing cells stay missing.
///
/// Sensor columns are selected on the table as it is now, not as it was
/// loaded.
pub fn min_max_scale(batch: &DataBatch, selector: &ColumnSelector) -> Result<DataBatch> {
    let targets = selector.select(batch);
    if targets.is_empty() || batch.row_count() == 0 {
        tracing::debug!("No sensor columns or rows to normalize");
        return Ok(batch.clone());
    }

    let columns = batch
        .clone()
        .into_columns()
        .into_iter()
        .map(|col| {
            if !selector.matches(&col.name) {
                return Ok(col);
            }
            let values = numeric(&col, Step::Normalize)?;
            let Some(range) = MinMax::fit(&values) else {
                return Ok(col);
            };
            let scaled = values
                .into_iter()
                .map(|v| v.map(|x| range.scale(x)))
                .collect();
            tracing::debug!(column = %col.name, min = range.min, max = range.max, "Scaled column");
            Ok(Column::new(col.name, ColumnValues::Float(scaled)))
        })
        .collect::<Result<Vec<_>>>()?;
    let out = DataBatch::new(columns)?;

    tracing::info!(columns = targets.len(), "Normalized sensor columns");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ColumnType;
    use crate::error::PrepError;
    use crate::steps::LABEL_COLUMN;

    fn batch() -> DataBatch {
        DataBatch::new(vec![
            Column::new(
                "Sensor1",
                ColumnValues::Integer(vec![Some(2), Some(4), Some(6)]),
            ),
            Column::new(
                "Sensor2",
                ColumnValues::Float(vec![Some(5.0), None, Some(5.0)]),
            ),
            Column::new("Other", ColumnValues::Float(vec![Some(100.0), Some(0.0), Some(1.0)])),
            Column::new(LABEL_COLUMN, ColumnValues::Integer(vec![Some(-1), Some(1), Some(1)])),
        ])
        .unwrap()
    }

    #[test]
    fn test_scales_only_sensors() {
        let out = min_max_scale(&batch(), &ColumnSelector::sensors()).unwrap();
        assert_eq!(
            out.column("Sensor1").unwrap().values,
            ColumnValues::Float(vec![Some(0.0), Some(0.5), Some(1.0)])
        );
        assert_eq!(out.column("Other").unwrap().values, batch().column("Other").unwrap().values);
        assert_eq!(out.column(LABEL_COLUMN).unwrap().dtype(), ColumnType::Integer);
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let out = min_max_scale(&batch(), &ColumnSelector::sensors()).unwrap();
        assert_eq!(
            out.column("Sensor2").unwrap().values,
            ColumnValues::Float(vec![Some(0.0), None, Some(0.0)])
        );
    }

    #[test]
    fn test_unit_range_is_identity() {
        let b = DataBatch::new(vec![Column::new(
            "Sensor1",
            ColumnValues::Float(vec![Some(0.0), Some(0.25), Some(1.0)]),
        )])
        .unwrap();
        let out = min_max_scale(&b, &ColumnSelector::sensors()).unwrap();
        assert_eq!(out, b);
    }

    #[test]
    fn test_non_numeric_sensor_is_fatal() {
        let b = DataBatch::new(vec![Column::new(
            "SensorTag",
            ColumnValues::String(vec![Some("x".into())]),
        )])
        .unwrap();
        assert!(matches!(
            min_max_scale(&b, &ColumnSelector::sensors()),
            Err(PrepError::NonNumericColumn { .. })
        ));
    }

    #[test]
    fn test_wide_table_keeps_layout() {
        let rows = 200;
        let mut columns: Vec<Column> = (0..300)
            .map(|s| {
                Column::new(
                    format!("Sensor{s}"),
                    ColumnValues::Float((0..rows).map(|r| Some((r * (s + 1)) as f64)).collect()),
                )
            })
            .collect();
        columns.insert(
            150,
            Column::new("Time", ColumnValues::String(vec![Some("t".into()); rows])),
        );
        let b = DataBatch::new(columns).unwrap();

        let out = min_max_scale(&b, &ColumnSelector::sensors()).unwrap();
        assert_eq!(out.column_names(), b.column_names());
        assert_eq!(out.row_count(), rows);
        assert_eq!(out.column("Time").unwrap().dtype(), ColumnType::String);
        for name in ["Sensor0", "Sensor149", "Sensor299"] {
            let values = &out.column(name).unwrap().values;
            assert_eq!(values.render(0).as_deref(), Some("0.0"));
            assert_eq!(values.render(rows - 1).as_deref(), Some("1.0"));
        }
    }

    #[test]
    fn test_fit() {
        assert_eq!(
            MinMax::fit(&[None, Some(3.0), Some(-1.0)]),
            Some(MinMax { min: -1.0, max: 3.0 })
        );
        assert_eq!(MinMax::fit(&[None]), None);
    }
}
