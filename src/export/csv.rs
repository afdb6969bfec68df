//! CSV Export functionality
//!
//! Writes a [`ReportTable`] as a header row followed by data rows.

use std::io::Write;

use crate::error::{CheckdeskError, CheckdeskResult};
use crate::reports::ReportTable;

/// Write `table` to `writer` as CSV
pub fn write_table_csv<W: Write>(table: &ReportTable, writer: W) -> CheckdeskResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(&table.headers)?;
    for row in &table.rows {
        csv.write_record(row)?;
    }
    csv.flush()
        .map_err(|e| CheckdeskError::Export(format!("Failed to flush CSV: {}", e)))?;
    Ok(())
}
