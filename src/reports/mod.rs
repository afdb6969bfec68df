//! Reports module for checkdesk
//!
//! Summary, per-bank, per-client and monthly reports. Each one renders to
//! terminal text and to a [`ReportTable`] that the exporters write out.

pub mod bank;
pub mod client;
pub mod monthly;
pub mod summary;

use chrono::NaiveDate;
use serde::Serialize;

use crate::storage::CheckFilter;

pub use bank::{BankReport, BankReportRow};
pub use client::{ClientReport, ClientReportRow};
pub use monthly::{MonthlyReport, MonthlyReportRow};
pub use summary::{SummaryReport, SummaryStatusRow};

/// Due-date window a report covers; open ends are unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ReportRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn filter(&self) -> CheckFilter {
        CheckFilter {
            due_from: self.from,
            due_to: self.to,
            ..CheckFilter::default()
        }
    }

    pub fn describe(&self) -> String {
        match (self.from, self.to) {
            (Some(from), Some(to)) => format!("{} to {}", from, to),
            (Some(from), None) => format!("from {}", from),
            (None, Some(to)) => format!("until {}", to),
            (None, None) => "all dates".to_string(),
        }
    }
}

/// A report flattened to a header row and text cells
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTable {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Indexes of columns holding plain decimal numbers
    pub numeric: Vec<usize>,
}

impl ReportTable {
    pub fn new(title: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            title: title.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
            numeric: Vec::new(),
        }
    }

    pub fn numeric(mut self, columns: &[usize]) -> Self {
        self.numeric = columns.to_vec();
        self
    }

    pub fn is_numeric(&self, column: usize) -> bool {
        self.numeric.contains(&column)
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Any generated report
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Report {
    Summary(SummaryReport),
    Bank(BankReport),
    Client(ClientReport),
    Monthly(MonthlyReport),
}

impl Report {
    /// Short name used in export file names
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Summary(_) => "summary",
            Self::Bank(_) => "bank",
            Self::Client(_) => "client",
            Self::Monthly(_) => "monthly",
        }
    }

    pub fn table(&self) -> ReportTable {
        match self {
            Self::Summary(r) => r.table(),
            Self::Bank(r) => r.table(),
            Self::Client(r) => r.table(),
            Self::Monthly(r) => r.table(),
        }
    }

    pub fn format_terminal(&self) -> String {
        match self {
            Self::Summary(r) => r.format_terminal(),
            Self::Bank(r) => r.format_terminal(),
            Self::Client(r) => r.format_terminal(),
            Self::Monthly(r) => r.format_terminal(),
        }
    }
}

/// Percentage of `part` in `whole`, 0 when `whole` is 0
pub(crate) fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}
