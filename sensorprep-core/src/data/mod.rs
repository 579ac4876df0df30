//! Table model, CSV ingestion and export, column statistics.

pub mod batch;
pub mod schema;
pub mod sink;
pub mod source;
pub mod stats;

pub use batch::{Column, ColumnValues, DataBatch};
pub use schema::{ColumnSchema, ColumnType, SchemaDefinition};
pub use sink::{DEFAULT_OUTPUT_NAME, save_csv, to_csv_bytes, write_csv};
pub use source::{CsvSource, read_csv};
pub use stats::ValueCount;
