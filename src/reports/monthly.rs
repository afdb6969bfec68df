//! Monthly Report
//!
//! Checks issued per calendar month of one year.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::{CheckdeskError, CheckdeskResult};
use crate::models::{CheckStatus, Money};
use crate::storage::{CheckFilter, Storage};

use super::ReportTable;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReportRow {
    /// 1 to 12
    pub month: u32,
    pub count: u64,
    pub amount: Money,
    pub cashed_amount: Money,
    pub bounced: u64,
}

impl MonthlyReportRow {
    fn empty(month: u32) -> Self {
        Self {
            month,
            count: 0,
            amount: Money::zero(),
            cashed_amount: Money::zero(),
            bounced: 0,
        }
    }

    pub fn label(&self, year: i32) -> String {
        format!("{}-{:02}", year, self.month)
    }
}

/// Monthly Report
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReport {
    pub year: i32,
    /// Always twelve rows, January first
    pub rows: Vec<MonthlyReportRow>,
    pub total_count: u64,
    pub total_amount: Money,
}

impl MonthlyReport {
    pub fn generate(storage: &Storage, year: i32) -> CheckdeskResult<Self> {
        let invalid = || CheckdeskError::Validation(format!("Invalid report year {}", year));
        let filter = CheckFilter {
            issue_from: Some(NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?),
            issue_to: Some(NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(invalid)?),
            ..CheckFilter::default()
        };

        let mut rows: Vec<MonthlyReportRow> = (1..=12).map(MonthlyReportRow::empty).collect();
        for details in storage.checks().list(&filter)? {
            let check = &details.check;
            let row = &mut rows[check.issue_date.month0() as usize];
            row.count += 1;
            row.amount += check.amount;
            match check.status {
                CheckStatus::Cashed => row.cashed_amount += check.amount,
                CheckStatus::Bounced => row.bounced += 1,
                _ => {}
            }
        }

        let total_count = rows.iter().map(|r| r.count).sum();
        let total_amount = rows.iter().map(|r| r.amount).sum();
        Ok(Self {
            year,
            rows,
            total_count,
            total_amount,
        })
    }

    /// Format the report for terminal display
    pub fn format_terminal(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Monthly Report: {}\n", self.year));
        output.push_str(&"=".repeat(64));
        output.push('\n');
        output.push_str(&format!(
            "{:<9} {:>7} {:>18} {:>18} {:>8}\n",
            "Month", "Checks", "Amount", "Cashed", "Bounced"
        ));
        output.push_str(&"-".repeat(64));
        output.push('\n');

        for row in &self.rows {
            output.push_str(&format!(
                "{:<9} {:>7} {:>18} {:>18} {:>8}\n",
                row.label(self.year),
                row.count,
                row.amount.grouped(),
                row.cashed_amount.grouped(),
                row.bounced
            ));
        }

        output.push_str(&"-".repeat(64));
        output.push('\n');
        output.push_str(&format!(
            "{:<9} {:>7} {:>18}\n",
            "TOTAL",
            self.total_count,
            self.total_amount.grouped()
        ));

        output
    }

    pub fn table(&self) -> ReportTable {
        let mut table = ReportTable::new(
            format!("Monthly Report {}", self.year),
            &["Month", "Checks", "Amount", "Cashed Amount", "Bounced"],
        )
        .numeric(&[1, 2, 3, 4]);
        for row in &self.rows {
            table.push(vec![
                row.label(self.year),
                row.count.to_string(),
                row.amount.to_string(),
                row.cashed_amount.to_string(),
                row.bounced.to_string(),
            ]);
        }
        table
    }
}
