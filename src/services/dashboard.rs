//! Dashboard figures
//!
//! Everything the dashboard shows, computed in one pass for a given day.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Serialize;

use crate::error::CheckdeskResult;
use crate::models::{CheckStatus, Money};
use crate::storage::checks::{BankTotal, MonthTotal, StatusTotal};
use crate::storage::{CheckFilter, Storage};

/// Number of banks in the ranking
pub const TOP_BANKS: usize = 5;

/// Months of history in the volume chart, current month included
pub const VOLUME_MONTHS: u32 = 12;

/// Snapshot of the check book on one day
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub today: NaiveDate,
    pub total_count: u64,
    pub total_amount: Money,
    /// One entry per status, zeros included, in status order
    pub by_status: Vec<StatusTotal>,
    pub overdue_count: u64,
    pub overdue_amount: Money,
    pub due_soon_count: u64,
    pub due_soon_amount: Money,
    pub top_banks: Vec<BankTotal>,
    /// One entry per month, oldest first, gaps filled with zeros
    pub monthly: Vec<MonthTotal>,
}

impl DashboardStats {
    pub fn status(&self, status: CheckStatus) -> Option<&StatusTotal> {
        self.by_status.iter().find(|t| t.status == status)
    }

    /// Share of closed checks that were cashed, in percent
    pub fn collection_rate(&self) -> Option<f64> {
        let count = |s| self.status(s).map(|t| t.count).unwrap_or(0);
        let cashed = count(CheckStatus::Cashed);
        let bounced = count(CheckStatus::Bounced);
        let closed = cashed + bounced;
        (closed > 0).then(|| cashed as f64 * 100.0 / closed as f64)
    }
}

/// Service computing dashboard figures
pub struct DashboardService<'a> {
    storage: &'a Storage,
}

impl<'a> DashboardService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn stats(&self, today: NaiveDate, notification_days: u32) -> CheckdeskResult<DashboardStats> {
        let checks = self.storage.checks();

        let (total_count, total_amount) = checks.totals(&CheckFilter::default())?;

        let found = checks.status_totals(&CheckFilter::default())?;
        let by_status = CheckStatus::ALL
            .iter()
            .map(|&status| {
                found
                    .iter()
                    .find(|t| t.status == status)
                    .cloned()
                    .unwrap_or(StatusTotal {
                        status,
                        count: 0,
                        amount: Money::zero(),
                    })
            })
            .collect();

        let (overdue_count, overdue_amount) = checks.totals(&CheckFilter::overdue(today))?;

        let until = today
            .checked_add_days(Days::new(u64::from(notification_days)))
            .unwrap_or(NaiveDate::MAX);
        let (due_soon_count, due_soon_amount) =
            checks.totals(&CheckFilter::open_due_between(today, until))?;

        let top_banks = checks.top_banks(TOP_BANKS)?;
        let monthly = self.monthly_volume(today)?;

        Ok(DashboardStats {
            today,
            total_count,
            total_amount,
            by_status,
            overdue_count,
            overdue_amount,
            due_soon_count,
            due_soon_amount,
            top_banks,
            monthly,
        })
    }

    fn monthly_volume(&self, today: NaiveDate) -> CheckdeskResult<Vec<MonthTotal>> {
        let this_month = today.with_day(1).unwrap_or(today);
        let first = this_month
            .checked_sub_months(Months::new(VOLUME_MONTHS - 1))
            .unwrap_or(this_month);
        let found = self.storage.checks().monthly_volume(first)?;

        Ok((0..VOLUME_MONTHS)
            .filter_map(|offset| first.checked_add_months(Months::new(offset)))
            .map(|month| {
                let key = month.format("%Y-%m").to_string();
                found
                    .iter()
                    .find(|m| m.month == key)
                    .cloned()
                    .unwrap_or(MonthTotal {
                        month: key,
                        count: 0,
                        amount: Money::zero(),
                    })
            })
            .collect())
    }
}
