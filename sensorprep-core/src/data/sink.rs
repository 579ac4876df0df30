//! Writing tables as UTF-8 CSV with a byte-order mark.

use crate::data::batch::DataBatch;
use crate::error::Result;
use std::io::Write;
use std::path::Path;

/// Default name for the exported artifact.
pub const DEFAULT_OUTPUT_NAME: &str = "preprocessed_data.csv";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Serialize `batch` into `writer`: BOM, header row, then one line per row.
pub fn write_csv<W: Write>(batch: &DataBatch, mut writer: W) -> Result<()> {
    writer.write_all(UTF8_BOM)?;
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    wtr.write_record(batch.column_names())?;
    for row in 0..batch.row_count() {
        wtr.write_record(
            batch
                .columns()
                .iter()
                .map(|c| c.values.render(row).unwrap_or_default()),
        )?;
    }
    wtr.flush()?;
    Ok(())
}

/// The exported file contents as bytes.
pub fn to_csv_bytes(batch: &DataBatch) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_csv(batch, &mut buf)?;
    Ok(buf)
}

/// Write `batch` to `path`, replacing any existing file.
pub fn save_csv(batch: &DataBatch, path: &Path) -> Result<()> {
    let bytes = to_csv_bytes(batch)?;
    std::fs::write(path, bytes)?;
    tracing::info!(
        path = %path.display(),
        rows = batch.row_count(),
        columns = batch.column_count(),
        "Wrote CSV"
    );
    Ok(())
}
