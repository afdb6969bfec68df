//! Summary Report
//!
//! Counts and amounts per status for checks due in a date range, with the
//! overdue share as of a given day.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::CheckdeskResult;
use crate::models::{CheckStatus, Money};
use crate::storage::{CheckFilter, Storage};

use super::{percent, ReportRange, ReportTable};

/// One status line of the summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStatusRow {
    pub status: CheckStatus,
    pub count: u64,
    pub amount: Money,
    /// Share of the checks in range, in percent
    pub percentage: f64,
}

/// Summary Report
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub range: ReportRange,
    pub generated_on: NaiveDate,
    pub rows: Vec<SummaryStatusRow>,
    pub total_count: u64,
    pub total_amount: Money,
    pub overdue_count: u64,
    pub overdue_amount: Money,
}

impl SummaryReport {
    /// Generate a summary of the checks due within `range`
    pub fn generate(storage: &Storage, range: ReportRange, today: NaiveDate) -> CheckdeskResult<Self> {
        let checks = storage.checks();
        let filter = range.filter();

        let (total_count, total_amount) = checks.totals(&filter)?;
        let found = checks.status_totals(&filter)?;
        let rows = CheckStatus::ALL
            .iter()
            .map(|&status| {
                let (count, amount) = found
                    .iter()
                    .find(|t| t.status == status)
                    .map(|t| (t.count, t.amount))
                    .unwrap_or((0, Money::zero()));
                SummaryStatusRow {
                    status,
                    count,
                    amount,
                    percentage: percent(count, total_count),
                }
            })
            .collect();

        let overdue = CheckFilter {
            due_from: range.from,
            ..CheckFilter::overdue(today)
        };
        let overdue = match range.to {
            Some(to) if overdue.due_to.map_or(true, |d| to < d) => CheckFilter {
                due_to: Some(to),
                ..overdue
            },
            _ => overdue,
        };
        let (overdue_count, overdue_amount) = checks.totals(&overdue)?;

        Ok(Self {
            range,
            generated_on: today,
            rows,
            total_count,
            total_amount,
            overdue_count,
            overdue_amount,
        })
    }

    /// Format the report for terminal display
    pub fn format_terminal(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Summary Report: {}\n", self.range.describe()));
        output.push_str(&"=".repeat(60));
        output.push('\n');
        output.push_str(&format!(
            "{:<14} {:>8} {:>18} {:>8}\n",
            "Status", "Count", "Amount", "%"
        ));
        output.push_str(&"-".repeat(60));
        output.push('\n');

        for row in &self.rows {
            output.push_str(&format!(
                "{:<14} {:>8} {:>18} {:>7.1}%\n",
                row.status.to_string(),
                row.count,
                row.amount.grouped(),
                row.percentage
            ));
        }

        output.push_str(&"-".repeat(60));
        output.push('\n');
        output.push_str(&format!(
            "{:<14} {:>8} {:>18}\n",
            "TOTAL",
            self.total_count,
            self.total_amount.grouped()
        ));
        output.push_str(&format!(
            "{:<14} {:>8} {:>18}   (as of {})\n",
            "Overdue",
            self.overdue_count,
            self.overdue_amount.grouped(),
            self.generated_on
        ));

        output
    }

    pub fn table(&self) -> ReportTable {
        let mut table = ReportTable::new(
            format!("Summary Report ({})", self.range.describe()),
            &["Status", "Count", "Amount", "Percentage"],
        )
        .numeric(&[1, 2, 3]);
        for row in &self.rows {
            table.push(vec![
                row.status.to_string(),
                row.count.to_string(),
                row.amount.to_string(),
                format!("{:.1}", row.percentage),
            ]);
        }
        table.push(vec![
            "Total".to_string(),
            self.total_count.to_string(),
            self.total_amount.to_string(),
            "100.0".to_string(),
        ]);
        table.push(vec![
            "Overdue".to_string(),
            self.overdue_count.to_string(),
            self.overdue_amount.to_string(),
            format!("{:.1}", percent(self.overdue_count, self.total_count)),
        ]);
        table
    }
}
