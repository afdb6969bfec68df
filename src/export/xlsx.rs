//! Excel export
//!
//! One worksheet per table with a bold header row. Numeric columns are
//! written as numbers so spreadsheets can sum them.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::error::{CheckdeskError, CheckdeskResult};
use crate::reports::ReportTable;

const MIN_COLUMN_WIDTH: usize = 10;
const MAX_COLUMN_WIDTH: usize = 50;

fn xlsx_error(e: XlsxError) -> CheckdeskError {
    CheckdeskError::Export(format!("Excel: {}", e))
}

/// Worksheet names are capped at 31 characters and exclude `[]:*?/\`
fn sheet_name(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| if "[]:*?/\\".contains(c) { '-' } else { c })
        .take(31)
        .collect();
    if cleaned.trim().is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}

/// Write `table` to a new workbook at `path`
pub fn write_table_xlsx(table: &ReportTable, path: &Path) -> CheckdeskResult<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let number_format = Format::new().set_num_format("#,##0.00");

    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(sheet_name(&table.title))
        .map_err(xlsx_error)?;

    for (col, header) in table.headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, header, &header_format)
            .map_err(xlsx_error)?;
    }

    for (idx, row) in table.rows.iter().enumerate() {
        let row_num = idx as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            let col_num = col as u16;
            match cell.parse::<f64>() {
                Ok(value) if table.is_numeric(col) => {
                    worksheet
                        .write_number_with_format(row_num, col_num, value, &number_format)
                        .map_err(xlsx_error)?;
                }
                _ => {
                    worksheet
                        .write_string(row_num, col_num, cell)
                        .map_err(xlsx_error)?;
                }
            }
        }
    }

    for (col, header) in table.headers.iter().enumerate() {
        let widest = table
            .rows
            .iter()
            .filter_map(|row| row.get(col))
            .map(|cell| cell.chars().count())
            .chain(std::iter::once(header.chars().count()))
            .max()
            .unwrap_or(MIN_COLUMN_WIDTH);
        let width = (widest + 2).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
        worksheet
            .set_column_width(col as u16, width as f64)
            .map_err(xlsx_error)?;
    }

    workbook.save(path).map_err(xlsx_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sheet_name() {
        assert_eq!(sheet_name("Summary Report (2024-01-01 to 2024-03-31)").len(), 31);
        assert_eq!(sheet_name("a/b"), "a-b");
        assert_eq!(sheet_name(""), "Sheet1");
    }

    #[test]
    fn test_writes_workbook() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("report.xlsx");

        let mut table = ReportTable::new("Banks", &["Bank", "Amount"]).numeric(&[1]);
        table.push(vec!["BMCE".into(), "1500.00".into()]);
        write_table_xlsx(&table, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        // xlsx files are zip archives
        assert_eq!(&bytes[..2], b"PK");
    }
}
