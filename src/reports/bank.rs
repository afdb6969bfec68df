//! Bank Report
//!
//! Check volume per bank with the share of bounced checks.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::CheckdeskResult;
use crate::models::{BankId, CheckStatus, Money};
use crate::storage::Storage;

use super::{percent, ReportRange, ReportTable};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankReportRow {
    pub bank_id: BankId,
    pub bank_name: String,
    pub count: u64,
    pub amount: Money,
    pub cashed: u64,
    pub bounced: u64,
    /// Bounced share of the bank's checks, in percent
    pub bounce_rate: f64,
}

/// Bank Report
#[derive(Debug, Clone, Serialize)]
pub struct BankReport {
    pub range: ReportRange,
    /// Largest amount first
    pub rows: Vec<BankReportRow>,
}

impl BankReport {
    pub fn generate(storage: &Storage, range: ReportRange) -> CheckdeskResult<Self> {
        let mut per_bank: BTreeMap<BankId, BankReportRow> = BTreeMap::new();
        for details in storage.checks().list(&range.filter())? {
            let check = &details.check;
            let row = per_bank.entry(check.bank_id).or_insert_with(|| BankReportRow {
                bank_id: check.bank_id,
                bank_name: details.bank_name.clone(),
                count: 0,
                amount: Money::zero(),
                cashed: 0,
                bounced: 0,
                bounce_rate: 0.0,
            });
            row.count += 1;
            row.amount += check.amount;
            match check.status {
                CheckStatus::Cashed => row.cashed += 1,
                CheckStatus::Bounced => row.bounced += 1,
                _ => {}
            }
        }

        let mut rows: Vec<BankReportRow> = per_bank
            .into_values()
            .map(|mut row| {
                row.bounce_rate = percent(row.bounced, row.count);
                row
            })
            .collect();
        rows.sort_by(|a, b| {
            b.amount
                .cmp(&a.amount)
                .then_with(|| a.bank_name.cmp(&b.bank_name))
        });

        Ok(Self { range, rows })
    }

    /// Format the report for terminal display
    pub fn format_terminal(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Bank Report: {}\n", self.range.describe()));
        output.push_str(&"=".repeat(80));
        output.push('\n');
        output.push_str(&format!(
            "{:<28} {:>7} {:>18} {:>7} {:>8} {:>8}\n",
            "Bank", "Checks", "Amount", "Cashed", "Bounced", "Rate"
        ));
        output.push_str(&"-".repeat(80));
        output.push('\n');

        for row in &self.rows {
            output.push_str(&format!(
                "{:<28} {:>7} {:>18} {:>7} {:>8} {:>7.1}%\n",
                row.bank_name,
                row.count,
                row.amount.grouped(),
                row.cashed,
                row.bounced,
                row.bounce_rate
            ));
        }

        if self.rows.is_empty() {
            output.push_str("No checks in range.\n");
        }

        output
    }

    pub fn table(&self) -> ReportTable {
        let mut table = ReportTable::new(
            format!("Bank Report ({})", self.range.describe()),
            &["Bank", "Checks", "Amount", "Cashed", "Bounced", "Bounce Rate"],
        )
        .numeric(&[1, 2, 3, 4, 5]);
        for row in &self.rows {
            table.push(vec![
                row.bank_name.clone(),
                row.count.to_string(),
                row.amount.to_string(),
                row.cashed.to_string(),
                row.bounced.to_string(),
                format!("{:.1}", row.bounce_rate),
            ]);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::fixtures::storage;

    #[test]
    fn test_bank_report() {
        let storage = storage();
        let report = BankReport::generate(&storage, ReportRange::default()).unwrap();

        assert_eq!(report.rows.len(), 2);
        let bp = &report.rows[0];
        assert_eq!(bp.bank_name, "Banque Populaire");
        assert_eq!(bp.count, 3);
        assert_eq!(bp.amount, Money::from_units(3_750, 0));
        assert_eq!(bp.bounced, 1);
        assert!((bp.bounce_rate - 33.333).abs() < 0.01);

        let awb = &report.rows[1];
        assert_eq!(awb.bounce_rate, 0.0);

        assert_eq!(report.table().len(), 2);
        assert!(report.format_terminal().contains("Attijariwafa Bank"));
    }
}
