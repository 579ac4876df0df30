//! Column types and type inference for CSV-sourced tables.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Column data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Float,
    String,
    DateTime,
}

impl ColumnType {
    /// `Integer` and `Float` are the numeric types; everything else is not.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Integer => "int64",
            Self::Float => "float64",
            Self::String => "string",
            Self::DateTime => "datetime",
        };
        f.write_str(name)
    }
}

/// Schema definition for a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub columns: Vec<ColumnSchema>,
}

/// Schema for a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub dtype: ColumnType,
    pub nullable: bool,
}

/// Cell texts treated as missing when reading CSV.
pub const MISSING_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "#N/A", "<NA>",
];

/// Whether a raw CSV cell denotes a missing value.
pub fn is_missing_marker(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell.trim())
}

/// Infer a column type from its raw cell texts.
///
/// Integers with gaps are widened to `Float`, since an integer column cannot
/// carry missing values once loaded. An all-missing column is `Float`.
pub fn infer_column_type(cells: &[&str]) -> ColumnType {
    let mut has_missing = false;
    let mut all_int = true;
    let mut all_float = true;
    let mut seen_value = false;

    for cell in cells {
        if is_missing_marker(cell) {
            has_missing = true;
            continue;
        }
        seen_value = true;
        let trimmed = cell.trim();
        if all_int && trimmed.parse::<i64>().is_err() {
            all_int = false;
        }
        if !all_int && trimmed.parse::<f64>().is_err() {
            all_float = false;
            break;
        }
    }

    if !seen_value {
        return ColumnType::Float;
    }
    if all_int && !has_missing {
        ColumnType::Integer
    } else if all_int || all_float {
        ColumnType::Float
    } else {
        ColumnType::String
    }
}
