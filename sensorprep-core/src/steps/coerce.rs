//! Step 1: coerce a column to timestamps.

use crate::data::{ColumnValues, DataBatch};
use crate::error::{PrepError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%Y%m%d"];

/// Best-effort timestamp parse of one cell.
///
/// Offsets are normalised to UTC; date-only values land on midnight.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Convert `column` to `DateTime`.
///
/// Text cells are parsed with [`parse_timestamp`]; numeric cells are read as
/// nanoseconds since the Unix epoch. Any unparseable cell fails the whole
/// conversion.
pub fn to_datetime(batch: &DataBatch, column: &str) -> Result<DataBatch> {
    let col = batch
        .column(column)
        .ok_or_else(|| PrepError::column_not_found(column))?;

    let converted: Vec<Option<NaiveDateTime>> = match &col.values {
        ColumnValues::DateTime(_) => return Ok(batch.clone()),
        ColumnValues::Integer(v) => v
            .iter()
            .map(|c| c.map(|ns| DateTime::from_timestamp_nanos(ns).naive_utc()))
            .collect(),
        ColumnValues::Float(v) => v
            .iter()
            .map(|c| c.map(|ns| DateTime::from_timestamp_nanos(ns as i64).naive_utc()))
            .collect(),
        ColumnValues::String(v) => v
            .iter()
            .enumerate()
            .map(|(row, cell)| match cell {
                None => Ok(None),
                Some(text) => parse_timestamp(text).map(Some).ok_or_else(|| {
                    PrepError::TimestampParse {
                        column: column.to_string(),
                        row,
                        value: text.clone(),
                    }
                }),
            })
            .collect::<Result<Vec<_>>>()?,
    };

    tracing::debug!(column, "Converted column to datetime");
    batch.with_values(column, ColumnValues::DateTime(converted))
}
