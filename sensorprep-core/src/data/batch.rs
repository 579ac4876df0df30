//! Columnar in-memory table.

use crate::data::schema::{ColumnSchema, ColumnType, SchemaDefinition};
use crate::error::{PrepError, Result};
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Typed cell storage for one column. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum ColumnValues {
    Integer(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    String(Vec<Option<String>>),
    DateTime(Vec<Option<NaiveDateTime>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Integer(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::String(v) => v.len(),
            Self::DateTime(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype(&self) -> ColumnType {
        match self {
            Self::Integer(_) => ColumnType::Integer,
            Self::Float(_) => ColumnType::Float,
            Self::String(_) => ColumnType::String,
            Self::DateTime(_) => ColumnType::DateTime,
        }
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            Self::Integer(v) => v.get(row).is_none_or(Option::is_none),
            Self::Float(v) => v.get(row).is_none_or(Option::is_none),
            Self::String(v) => v.get(row).is_none_or(Option::is_none),
            Self::DateTime(v) => v.get(row).is_none_or(Option::is_none),
        }
    }

    pub fn missing_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_missing(i)).count()
    }

    /// Numeric view of the column, or `None` for non-numeric types.
    pub fn as_f64(&self) -> Option<Vec<Option<f64>>> {
        match self {
            Self::Integer(v) => Some(v.iter().map(|c| c.map(|i| i as f64)).collect()),
            Self::Float(v) => Some(v.clone()),
            Self::String(_) | Self::DateTime(_) => None,
        }
    }

    /// Text form of one cell as written to CSV. Missing cells render as `None`.
    pub fn render(&self, row: usize) -> Option<String> {
        match self {
            Self::Integer(v) => v.get(row).copied().flatten().map(|i| i.to_string()),
            Self::Float(v) => v.get(row).copied().flatten().map(format_float),
            Self::String(v) => v.get(row).cloned().flatten(),
            Self::DateTime(v) => v.get(row).copied().flatten().map(format_timestamp),
        }
    }

    /// Keep the cells at `rows`, in that order.
    fn select_rows(&self, rows: &[usize]) -> Self {
        fn pick<T: Clone>(v: &[Option<T>], rows: &[usize]) -> Vec<Option<T>> {
            rows.iter().map(|&r| v.get(r).cloned().flatten()).collect()
        }
        match self {
            Self::Integer(v) => Self::Integer(pick(v, rows)),
            Self::Float(v) => Self::Float(pick(v, rows)),
            Self::String(v) => Self::String(pick(v, rows)),
            Self::DateTime(v) => Self::DateTime(pick(v, rows)),
        }
    }
}

/// Float formatting that keeps integral values visibly floating (`1.0`).
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Timestamp formatting; fractional seconds only when present.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    if ts.nanosecond() == 0 {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

impl Column {
    pub fn new(name: impl Into<String>, values: ColumnValues) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn dtype(&self) -> ColumnType {
        self.values.dtype()
    }
}

/// A table of named columns whose rows are positionally aligned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataBatch {
    columns: Vec<Column>,
}

impl DataBatch {
    /// Build a table, checking that every column has the same length and
    /// that names are unique.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let expected = first.values.len();
            if let Some(bad) = columns.iter().find(|c| c.values.len() != expected) {
                return Err(PrepError::dataset(format!(
                    "column '{}' has {} rows, expected {}",
                    bad.name,
                    bad.values.len(),
                    expected
                )));
            }
        }
        for (i, col) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == col.name) {
                return Err(PrepError::dataset(format!(
                    "duplicate column name '{}'",
                    col.name
                )));
            }
        }
        Ok(Self { columns })
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn schema(&self) -> SchemaDefinition {
        SchemaDefinition {
            columns: self
                .columns
                .iter()
                .map(|c| ColumnSchema {
                    name: c.name.clone(),
                    dtype: c.dtype(),
                    nullable: c.values.missing_count() > 0,
                })
                .collect(),
        }
    }

    /// Return a copy with `name`'s cells replaced by `values`.
    pub fn with_values(&self, name: &str, values: ColumnValues) -> Result<Self> {
        if values.len() != self.row_count() {
            return Err(PrepError::dataset(format!(
                "replacement for '{name}' has {} rows, expected {}",
                values.len(),
                self.row_count()
            )));
        }
        let mut columns = self.columns.clone();
        let slot = columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| PrepError::column_not_found(name))?;
        slot.values = values;
        Ok(Self { columns })
    }

    /// Return a copy without the named columns. Unknown names are ignored.
    pub fn without_columns(&self, names: &[String]) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .filter(|c| !names.contains(&c.name))
                .cloned()
                .collect(),
        }
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Self {
        let rows: Vec<usize> = (0..self.row_count().min(n)).collect();
        Self {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.values.select_rows(&rows)))
                .collect(),
        }
    }
}
