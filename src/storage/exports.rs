//! Export history repository

use rusqlite::{params, Connection, Row};

use crate::error::CheckdeskResult;
use crate::models::ExportRecord;

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ExportRecord> {
    Ok(ExportRecord {
        id: row.get(0)?,
        filename: row.get(1)?,
        format: row.get(2)?,
        filters: row.get(3)?,
        record_count: row.get(4)?,
        file_size: row.get(5)?,
        created_by: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// SQLite-backed export history
pub struct ExportRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ExportRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, record: &ExportRecord) -> CheckdeskResult<()> {
        self.conn.execute(
            "INSERT INTO export_history (
                id, filename, format, filters, record_count, file_size, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.id,
                record.filename,
                record.format,
                record.filters,
                record.record_count,
                record.file_size,
                record.created_by,
                record.created_at,
            ],
        )?;
        Ok(())
    }

    /// Most recent exports first
    pub fn list(&self, limit: usize) -> CheckdeskResult<Vec<ExportRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, filename, format, filters, record_count, file_size, created_by, created_at
             FROM export_history
             ORDER BY created_at DESC
             LIMIT ?1",
        )?;
        let records = stmt
            .query_map([limit as i64], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;

    #[test]
    fn test_insert_and_list() {
        let storage = Storage::open_in_memory().unwrap();
        let record = ExportRecord::new("checks.csv", "csv", "{}", 12, 2048);
        storage.exports().insert(&record).unwrap();

        let listed = storage.exports().list(10).unwrap();
        assert_eq!(listed, vec![record]);
    }
}
