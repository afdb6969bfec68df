//! Shared formatting helpers for terminal output

use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Style};
use tabled::{Table, Tabled};

use crate::models::ExportRecord;
use crate::services::import::ImportResult;

#[derive(Tabled)]
struct ExportRow {
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Format")]
    format: String,
    #[tabled(rename = "Rows")]
    rows: u64,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "File")]
    file: String,
}

/// Format a percentage with appropriate precision
pub fn format_percentage(pct: f64) -> String {
    if pct < 0.1 && pct > 0.0 {
        format!("{:.2}%", pct)
    } else if pct < 10.0 {
        format!("{:.1}%", pct)
    } else {
        format!("{:.0}%", pct)
    }
}

/// Create a simple bar chart representation
pub fn format_bar(value: f64, max_value: f64, width: usize) -> String {
    if max_value <= 0.0 || value <= 0.0 {
        return " ".repeat(width);
    }

    let filled = ((value / max_value) * width as f64).round() as usize;
    let filled = filled.min(width);

    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Center a title within `width` columns
pub fn format_header(title: &str, width: usize) -> String {
    let len = title.chars().count();
    let padding = if len >= width { 0 } else { (width - len) / 2 };
    format!("{}{}", " ".repeat(padding), title)
}

pub fn separator(width: usize) -> String {
    "─".repeat(width)
}

pub fn double_separator(width: usize) -> String {
    "═".repeat(width)
}

/// A dash for blank optional text, otherwise the text itself
pub fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}

/// Render rows as a rounded table, right-aligning the given columns
pub(crate) fn render<T: Tabled>(rows: Vec<T>, right_aligned: &[usize]) -> String {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    for &col in right_aligned {
        table.modify(Columns::single(col), Alignment::right());
    }
    table.to_string()
}

/// Human readable byte count
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

pub fn format_export_history(records: &[ExportRecord]) -> String {
    if records.is_empty() {
        return "No exports yet.".to_string();
    }

    let rows = records
        .iter()
        .map(|record| ExportRow {
            when: record.created_at.format("%Y-%m-%d %H:%M").to_string(),
            format: record.format.clone(),
            rows: record.record_count,
            size: format_size(record.file_size),
            file: record.filename.clone(),
        })
        .collect();
    render(rows, &[2, 3])
}

pub fn format_import_result(result: &ImportResult) -> String {
    let mut output = format!(
        "Imported {} of {} row(s), {} skipped as already recorded",
        result.imported, result.total_rows, result.skipped
    );
    if !result.errors.is_empty() {
        output.push_str(&format!("\n{} row(s) rejected:", result.errors.len()));
        for error in &result.errors {
            output.push_str(&format!("\n  {}", error));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(0.05), "0.05%");
        assert_eq!(format_percentage(5.5), "5.5%");
        assert_eq!(format_percentage(55.5), "56%");
    }

    #[test]
    fn test_format_bar() {
        assert_eq!(format_bar(5.0, 10.0, 10), "█████░░░░░");
        assert_eq!(format_bar(0.0, 10.0, 4), "    ");
        assert_eq!(format_bar(20.0, 10.0, 4), "████");
    }

    #[test]
    fn test_header_and_dash() {
        assert_eq!(format_header("ab", 6), "  ab");
        assert_eq!(or_dash("  "), "-");
        assert_eq!(or_dash("x"), "x");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_format_import_result() {
        let result = ImportResult {
            total_rows: 3,
            imported: 1,
            skipped: 1,
            errors: vec!["line 4: missing amount".into()],
        };
        let output = format_import_result(&result);
        assert!(output.starts_with("Imported 1 of 3 row(s), 1 skipped"));
        assert!(output.contains("line 4: missing amount"));

        let history = format_export_history(&[ExportRecord::new("out.csv", "csv", "{}", 2, 100)]);
        assert!(history.contains("out.csv"));
        assert!(history.contains("100 B"));
    }
}
