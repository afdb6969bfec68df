//! Export module for checkdesk
//!
//! Provides data export in multiple formats:
//! - CSV and Excel: check lists and reports for spreadsheets
//! - PDF: printable check lists and reports
//! - JSON and YAML: check lists, reports, or a full database dump
//!
//! Every file written through [`ExportService`] is recorded in the export
//! history with its row count and size.

pub mod csv;
pub mod json;
pub mod pdf;
pub mod xlsx;
pub mod yaml;

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;

use crate::config::paths::CheckdeskPaths;
use crate::config::settings::ExportFormatPreference;
use crate::error::{CheckdeskError, CheckdeskResult};
use crate::models::{CheckDetails, ExportRecord, UserId};
use crate::reports::{Report, ReportTable};
use crate::storage::{CheckFilter, Storage};

pub use self::csv::write_table_csv;
pub use self::json::{export_full_json, import_from_json, FullExport, EXPORT_SCHEMA_VERSION};
pub use self::pdf::write_table_pdf;
pub use self::xlsx::write_table_xlsx;
pub use self::yaml::{export_full_yaml, import_from_yaml};

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Pdf,
    Json,
    Yaml,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "excel" => Some(Self::Xlsx),
            "pdf" => Some(Self::Pdf),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Pdf => "pdf",
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::parse)
    }
}

impl From<ExportFormatPreference> for ExportFormat {
    fn from(preference: ExportFormatPreference) -> Self {
        match preference {
            ExportFormatPreference::Csv => Self::Csv,
            ExportFormatPreference::Xlsx => Self::Xlsx,
            ExportFormatPreference::Pdf => Self::Pdf,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `<export_dir>/<stem>-YYYYMMDD-HHMMSS.<ext>`
pub fn default_export_path(
    paths: &CheckdeskPaths,
    stem: &str,
    format: ExportFormat,
    now: DateTime<Utc>,
) -> PathBuf {
    paths.export_dir().join(format!(
        "{}-{}.{}",
        stem,
        now.format("%Y%m%d-%H%M%S"),
        format.extension()
    ))
}

/// Flatten checks into a table
pub fn checks_table(checks: &[CheckDetails]) -> ReportTable {
    let mut table = ReportTable::new(
        "Checks",
        &[
            "Number", "Client", "Bank", "Branch", "Amount", "Currency", "Issue Date", "Due Date",
            "Status", "Depositor", "Invoice", "Notes",
        ],
    )
    .numeric(&[4]);
    for details in checks {
        let check = &details.check;
        table.push(vec![
            check.number.clone(),
            details.client_name.clone(),
            details.bank_name.clone(),
            details.branch_name.clone().unwrap_or_default(),
            check.amount.to_string(),
            check.currency.clone(),
            check.issue_date.to_string(),
            check.due_date.to_string(),
            check.status.to_string(),
            check.depositor_name.clone(),
            check.invoice_number.clone(),
            check.notes.clone(),
        ]);
    }
    table
}

fn ensure_parent(path: &Path) -> CheckdeskResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            CheckdeskError::Export(format!("Cannot create {}: {}", parent.display(), e))
        })?;
    }
    Ok(())
}

fn create_file(path: &Path) -> CheckdeskResult<BufWriter<File>> {
    ensure_parent(path)?;
    let file = File::create(path)
        .map_err(|e| CheckdeskError::Export(format!("Cannot create {}: {}", path.display(), e)))?;
    Ok(BufWriter::new(file))
}

fn write_serialized<T: Serialize>(value: &T, format: ExportFormat, path: &Path) -> CheckdeskResult<()> {
    let mut writer = create_file(path)?;
    match format {
        ExportFormat::Json => serde_json::to_writer_pretty(&mut writer, value)
            .map_err(|e| CheckdeskError::Export(e.to_string()))?,
        _ => serde_yaml::to_writer(&mut writer, value)
            .map_err(|e| CheckdeskError::Export(e.to_string()))?,
    }
    writer
        .flush()
        .map_err(|e| CheckdeskError::Export(e.to_string()))
}

fn write_table(table: &ReportTable, format: ExportFormat, path: &Path) -> CheckdeskResult<()> {
    match format {
        ExportFormat::Csv => {
            let writer = create_file(path)?;
            write_table_csv(table, writer)
        }
        ExportFormat::Xlsx => {
            ensure_parent(path)?;
            write_table_xlsx(table, path)
        }
        ExportFormat::Pdf => {
            ensure_parent(path)?;
            write_table_pdf(table, path)
        }
        ExportFormat::Json | ExportFormat::Yaml => write_serialized(table, format, path),
    }
}

/// Writes export files and keeps the export history
pub struct ExportService<'a> {
    storage: &'a Storage,
}

impl<'a> ExportService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Export the checks matching `filter`
    pub fn export_checks(
        &self,
        filter: &CheckFilter,
        format: ExportFormat,
        path: &Path,
        created_by: Option<UserId>,
    ) -> CheckdeskResult<ExportRecord> {
        let checks = self.storage.checks().list(filter)?;
        match format {
            ExportFormat::Json | ExportFormat::Yaml => write_serialized(&checks, format, path)?,
            _ => write_table(&checks_table(&checks), format, path)?,
        }

        let filters = serde_json::to_string(filter)?;
        self.record(path, format, filters, checks.len() as u64, created_by)
    }

    /// Export a generated report
    pub fn export_report(
        &self,
        report: &Report,
        format: ExportFormat,
        path: &Path,
        created_by: Option<UserId>,
    ) -> CheckdeskResult<ExportRecord> {
        let table = report.table();
        match format {
            ExportFormat::Json | ExportFormat::Yaml => write_serialized(report, format, path)?,
            _ => write_table(&table, format, path)?,
        }

        let filters = serde_json::json!({ "report": report.kind() }).to_string();
        self.record(path, format, filters, table.len() as u64, created_by)
    }

    /// Dump the whole database as JSON or YAML
    pub fn export_full(
        &self,
        format: ExportFormat,
        path: &Path,
        created_by: Option<UserId>,
    ) -> CheckdeskResult<ExportRecord> {
        if !matches!(format, ExportFormat::Json | ExportFormat::Yaml) {
            return Err(CheckdeskError::Export(format!(
                "A full export must be json or yaml, not {}",
                format
            )));
        }

        let mut writer = create_file(path)?;
        let count = if format == ExportFormat::Json {
            export_full_json(self.storage, &mut writer, true)?
        } else {
            export_full_yaml(self.storage, &mut writer)?
        };
        writer
            .flush()
            .map_err(|e| CheckdeskError::Export(e.to_string()))?;
        drop(writer);

        self.record(path, format, "{\"full\":true}".to_string(), count as u64, created_by)
    }

    /// Most recent exports first
    pub fn history(&self, limit: usize) -> CheckdeskResult<Vec<ExportRecord>> {
        self.storage.exports().list(limit)
    }

    fn record(
        &self,
        path: &Path,
        format: ExportFormat,
        filters: String,
        record_count: u64,
        created_by: Option<UserId>,
    ) -> CheckdeskResult<ExportRecord> {
        let file_size = std::fs::metadata(path)
            .map_err(|e| CheckdeskError::Export(format!("Cannot stat {}: {}", path.display(), e)))?
            .len();

        let mut record = ExportRecord::new(
            path.display().to_string(),
            format.as_str(),
            filters,
            record_count,
            file_size,
        );
        record.created_by = created_by;
        self.storage.exports().insert(&record)?;

        info!(
            "event=export status=ok format={} records={} bytes={} file={}",
            format,
            record_count,
            file_size,
            path.display()
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::{ReportRange, SummaryReport};
    use crate::models::{Bank, Check, CheckStatus, Client, ClientKind, Money};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn seeded() -> Storage {
        let storage = Storage::open_in_memory().unwrap();
        let bank = Bank::new("Société Générale", Some("SG".into()));
        storage.banks().insert(&bank).unwrap();
        let client = Client::new("Atlas, SARL", ClientKind::Company);
        storage.clients().insert(&client).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        for (number, status) in [("10", CheckStatus::Pending), ("11", CheckStatus::Cashed)] {
            let mut check =
                Check::new(number, Money::from_units(250, 50), "MAD", day, day, client.id, bank.id);
            check.status = status;
            storage.checks().insert(&check).unwrap();
        }
        storage
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(ExportFormat::parse("Excel"), Some(ExportFormat::Xlsx));
        assert_eq!(ExportFormat::parse("yml"), Some(ExportFormat::Yaml));
        assert_eq!(ExportFormat::parse("doc"), None);
        assert_eq!(
            ExportFormat::from_path(Path::new("out/list.pdf")),
            Some(ExportFormat::Pdf)
        );
    }

    #[test]
    fn test_export_checks_every_format() {
        let temp_dir = TempDir::new().unwrap();
        let storage = seeded();
        let service = ExportService::new(&storage);

        for format in [
            ExportFormat::Csv,
            ExportFormat::Xlsx,
            ExportFormat::Pdf,
            ExportFormat::Json,
            ExportFormat::Yaml,
        ] {
            let path = temp_dir.path().join(format!("checks.{}", format.extension()));
            let record = service
                .export_checks(&CheckFilter::default(), format, &path, None)
                .unwrap();
            assert_eq!(record.record_count, 2);
            assert!(record.file_size > 0);
            assert_eq!(record.file_size, std::fs::metadata(&path).unwrap().len());
        }

        let history = service.history(10).unwrap();
        assert_eq!(history.len(), 5);
    }

    #[test]
    fn test_export_filtered_csv() {
        let temp_dir = TempDir::new().unwrap();
        let storage = seeded();
        let path = temp_dir.path().join("nested").join("pending.csv");

        let filter = CheckFilter::default().with_status(CheckStatus::Pending);
        let record = ExportService::new(&storage)
            .export_checks(&filter, ExportFormat::Csv, &path, None)
            .unwrap();
        assert_eq!(record.record_count, 1);
        assert!(record.filters.contains("pending"));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Number,Client,Bank"));
        assert!(text.contains("\"Atlas, SARL\""));
        assert!(text.contains("250.50"));
    }

    #[test]
    fn test_export_report_and_full() {
        let temp_dir = TempDir::new().unwrap();
        let storage = seeded();
        let service = ExportService::new(&storage);

        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let report = Report::Summary(
            SummaryReport::generate(&storage, ReportRange::default(), today).unwrap(),
        );
        let path = temp_dir.path().join("summary.xlsx");
        let record = service
            .export_report(&report, ExportFormat::Xlsx, &path, None)
            .unwrap();
        assert_eq!(record.format, "xlsx");
        assert_eq!(record.record_count, 7);

        let full = temp_dir.path().join("dump.json");
        let record = service.export_full(ExportFormat::Json, &full, None).unwrap();
        assert_eq!(record.record_count, 2);
        let dump = import_from_json(&std::fs::read_to_string(&full).unwrap()).unwrap();
        assert_eq!(dump.checks.len(), 2);

        assert!(service
            .export_full(ExportFormat::Pdf, &temp_dir.path().join("x.pdf"), None)
            .is_err());
    }
}
