//! Client Report
//!
//! Per-client volume, bounced checks and the date of the latest activity.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::CheckdeskResult;
use crate::models::{CheckStatus, ClientId, Money};
use crate::storage::Storage;

use super::{ReportRange, ReportTable};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientReportRow {
    pub client_id: ClientId,
    pub client_name: String,
    pub count: u64,
    pub amount: Money,
    /// Pending or deposited amount
    pub open_amount: Money,
    pub bounced: u64,
    /// Latest issue date among the client's checks
    pub last_activity: Option<NaiveDate>,
}

/// Client Report
#[derive(Debug, Clone, Serialize)]
pub struct ClientReport {
    pub range: ReportRange,
    /// Largest amount first
    pub rows: Vec<ClientReportRow>,
}

impl ClientReport {
    pub fn generate(storage: &Storage, range: ReportRange) -> CheckdeskResult<Self> {
        let mut per_client: BTreeMap<ClientId, ClientReportRow> = BTreeMap::new();
        for details in storage.checks().list(&range.filter())? {
            let check = &details.check;
            let row = per_client
                .entry(check.client_id)
                .or_insert_with(|| ClientReportRow {
                    client_id: check.client_id,
                    client_name: details.client_name.clone(),
                    count: 0,
                    amount: Money::zero(),
                    open_amount: Money::zero(),
                    bounced: 0,
                    last_activity: None,
                });
            row.count += 1;
            row.amount += check.amount;
            if check.status.is_open() {
                row.open_amount += check.amount;
            }
            if check.status == CheckStatus::Bounced {
                row.bounced += 1;
            }
            row.last_activity = row.last_activity.max(Some(check.issue_date));
        }

        let mut rows: Vec<ClientReportRow> = per_client.into_values().collect();
        rows.sort_by(|a, b| {
            b.amount
                .cmp(&a.amount)
                .then_with(|| a.client_name.cmp(&b.client_name))
        });

        Ok(Self { range, rows })
    }

    /// Format the report for terminal display
    pub fn format_terminal(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Client Report: {}\n", self.range.describe()));
        output.push_str(&"=".repeat(84));
        output.push('\n');
        output.push_str(&format!(
            "{:<26} {:>7} {:>16} {:>16} {:>7} {:>11}\n",
            "Client", "Checks", "Amount", "Open", "Bounced", "Last"
        ));
        output.push_str(&"-".repeat(84));
        output.push('\n');

        for row in &self.rows {
            output.push_str(&format!(
                "{:<26} {:>7} {:>16} {:>16} {:>7} {:>11}\n",
                row.client_name,
                row.count,
                row.amount.grouped(),
                row.open_amount.grouped(),
                row.bounced,
                row.last_activity
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string())
            ));
        }

        if self.rows.is_empty() {
            output.push_str("No checks in range.\n");
        }

        output
    }

    pub fn table(&self) -> ReportTable {
        let mut table = ReportTable::new(
            format!("Client Report ({})", self.range.describe()),
            &["Client", "Checks", "Amount", "Open Amount", "Bounced", "Last Activity"],
        )
        .numeric(&[1, 2, 3, 4]);
        for row in &self.rows {
            table.push(vec![
                row.client_name.clone(),
                row.count.to_string(),
                row.amount.to_string(),
                row.open_amount.to_string(),
                row.bounced.to_string(),
                row.last_activity.map(|d| d.to_string()).unwrap_or_default(),
            ]);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::fixtures::{date, storage};

    #[test]
    fn test_client_report() {
        let storage = storage();
        let report = ClientReport::generate(&storage, ReportRange::default()).unwrap();

        assert_eq!(report.rows.len(), 2);
        let atlas = &report.rows[0];
        assert_eq!(atlas.client_name, "Atlas SARL");
        assert_eq!(atlas.count, 3);
        assert_eq!(atlas.amount, Money::from_units(6_000, 0));
        assert_eq!(atlas.open_amount, Money::from_units(3_000, 0));
        assert_eq!(atlas.bounced, 1);
        assert_eq!(atlas.last_activity, Some(date(2024, 2, 20)));

        let karim = &report.rows[1];
        assert_eq!(karim.last_activity, Some(date(2024, 3, 1)));
    }

    #[test]
    fn test_client_report_range() {
        let storage = storage();
        let range = ReportRange::new(Some(date(2024, 3, 1)), None);
        let report = ClientReport::generate(&storage, range).unwrap();
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows.iter().map(|r| r.count).sum::<u64>(), 2);
    }
}
