//! Loading tables from CSV.

use crate::data::batch::{Column, ColumnValues, DataBatch};
use crate::data::schema::{ColumnType, infer_column_type, is_missing_marker};
use crate::error::{PrepError, Result};
use std::io::Read;
use std::path::PathBuf;

/// CSV file data source.
#[derive(Debug, Clone)]
pub struct CsvSource {
    pub path: PathBuf,
    pub delimiter: u8,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Read the whole file into a typed table.
    pub fn load(&self) -> Result<DataBatch> {
        let file = std::fs::File::open(&self.path).map_err(|e| {
            PrepError::dataset(format!("failed to open {}: {e}", self.path.display()))
        })?;
        let batch = read_csv(file, self.delimiter)?;
        tracing::info!(
            path = %self.path.display(),
            rows = batch.row_count(),
            columns = batch.column_count(),
            "Loaded CSV"
        );
        Ok(batch)
    }
}

/// Parse CSV text from any reader, inferring a type per column.
pub fn read_csv<R: Read>(reader: R, delimiter: u8) -> Result<DataBatch> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(reader);

    let headers = dedupe_headers(
        rdr.headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect(),
    );
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(PrepError::dataset("CSV file has no header row"));
    }

    let records = rdr.records().collect::<std::result::Result<Vec<_>, _>>()?;

    let mut columns = Vec::with_capacity(headers.len());
    for (idx, name) in headers.into_iter().enumerate() {
        let cells: Vec<&str> = records.iter().map(|r| r.get(idx).unwrap_or("")).collect();
        let values = parse_cells(&cells, infer_column_type(&cells));
        columns.push(Column::new(name, values));
    }

    DataBatch::new(columns)
}

/// Duplicate header names get a `.N` suffix so every column stays addressable.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(headers.len());
    for name in headers {
        let mut candidate = name.clone();
        let mut n = 1;
        while out.contains(&candidate) {
            candidate = format!("{name}.{n}");
            n += 1;
        }
        out.push(candidate);
    }
    out
}

fn parse_cells(cells: &[&str], dtype: ColumnType) -> ColumnValues {
    let present = |cell: &&str| !is_missing_marker(cell);
    match dtype {
        ColumnType::Integer => ColumnValues::Integer(
            cells
                .iter()
                .map(|c| present(c).then(|| c.trim().parse::<i64>().ok()).flatten())
                .collect(),
        ),
        ColumnType::Float => ColumnValues::Float(
            cells
                .iter()
                .map(|c| present(c).then(|| c.trim().parse::<f64>().ok()).flatten())
                .collect(),
        ),
        ColumnType::String | ColumnType::DateTime => ColumnValues::String(
            cells
                .iter()
                .map(|c| present(c).then(|| c.to_string()))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_csv_types() {
        let text = "Time,Sensor1,Label,Note\n2024-01-01,1.5,-1,a\n2024-01-02,,1,b\n";
        let batch = read_csv(text.as_bytes(), b',').unwrap();
        assert_eq!(batch.row_count(), 2);
        assert_eq!(batch.column("Time").unwrap().dtype(), ColumnType::String);
        assert_eq!(batch.column("Sensor1").unwrap().dtype(), ColumnType::Float);
        assert_eq!(batch.column("Label").unwrap().dtype(), ColumnType::Integer);
        assert_eq!(
            batch.column("Sensor1").unwrap().values,
            ColumnValues::Float(vec![Some(1.5), None])
        );
    }

    #[test]
    fn test_read_csv_strips_bom_and_dedupes() {
        let text = "\u{feff}a,a\n1,2\n";
        let batch = read_csv(text.as_bytes(), b',').unwrap();
        assert_eq!(batch.column_names(), vec!["a", "a.1"]);
    }

    #[test]
    fn test_read_csv_ragged_row_is_error() {
        let text = "a,b\n1,2\n3\n";
        assert!(matches!(
            read_csv(text.as_bytes(), b','),
            Err(PrepError::Csv(_))
        ));
    }

    #[test]
    fn test_read_csv_semicolon() {
        let text = "a;b\n1;2\n";
        let batch = read_csv(text.as_bytes(), b';').unwrap();
        assert_eq!(batch.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_csv_source_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "x,y").unwrap();
        writeln!(file, "1,hello").unwrap();
        let batch = CsvSource::new(file.path()).load().unwrap();
        assert_eq!(batch.row_count(), 1);
        assert_eq!(batch.column("y").unwrap().dtype(), ColumnType::String);
    }

    #[test]
    fn test_csv_source_missing_file() {
        let err = CsvSource::new("/definitely/not/here.csv").load().unwrap_err();
        assert!(matches!(err, PrepError::Dataset(_)));
    }
}
