//! Advanced analytics
//!
//! Aging per status, client risk profiles and a cash-flow forecast. All of
//! it is computed in memory from the check list; `today` anchors every
//! date calculation.

use std::collections::{BTreeMap, HashMap};

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::error::CheckdeskResult;
use crate::models::{Check, CheckStatus, ClientId, Money};
use crate::storage::{CheckFilter, Storage};

/// Success rate assumed when no check has been closed in the last year
pub const DEFAULT_SUCCESS_RATE: f64 = 0.8;

/// How long checks stay in one status
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgingBucket {
    pub status: CheckStatus,
    pub count: u64,
    pub avg_days: f64,
    pub min_days: i64,
    pub max_days: i64,
    /// Share of all checks, in percent
    pub share: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            80.. => Self::Critical,
            60..=79 => Self::High,
            40..=59 => Self::Medium,
            _ => Self::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment behaviour of one client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientRiskProfile {
    pub client_id: ClientId,
    pub client_name: String,
    pub total_checks: u64,
    pub total_amount: Money,
    pub bounced: u64,
    /// Bounced share of all checks, in percent
    pub bounce_rate: f64,
    pub avg_processing_days: f64,
    pub last_bounce: Option<NaiveDate>,
    /// 0 to 100, higher is riskier
    pub score: u32,
    pub level: RiskLevel,
}

/// Inputs of the risk score
#[derive(Debug, Clone, Copy)]
pub struct RiskFactors {
    pub bounce_rate: f64,
    pub total_checks: u64,
    pub total_amount: Money,
    pub avg_processing_days: f64,
    pub days_since_last_bounce: Option<i64>,
}

/// Risk score out of 100
///
/// Bounce rate weighs up to 40 points, low volume 20, low amounts 15, slow
/// processing 10 and a recent bounce 15.
pub fn risk_score(factors: &RiskFactors) -> u32 {
    let mut score = (factors.bounce_rate * 2.0).min(40.0);

    score += match factors.total_checks {
        0..=4 => 20.0,
        5..=19 => 10.0,
        _ => 0.0,
    };

    let units = factors.total_amount.units();
    score += if units < 10_000 {
        15.0
    } else if units < 50_000 {
        8.0
    } else {
        0.0
    };

    score += if factors.avg_processing_days > 30.0 {
        10.0
    } else if factors.avg_processing_days > 14.0 {
        5.0
    } else {
        0.0
    };

    score += match factors.days_since_last_bounce {
        Some(days) if days < 30 => 15.0,
        Some(days) if days < 90 => 10.0,
        Some(days) if days < 180 => 5.0,
        _ => 0.0,
    };

    score.min(100.0).round() as u32
}

/// Expected collections on one due date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub count: u64,
    pub amount: Money,
    pub expected: Money,
    pub cumulative: Money,
}

/// Cash-flow forecast over a window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashFlowForecast {
    pub from: NaiveDate,
    pub days: u32,
    /// Historical share of closed checks that were cashed, 0.0 to 1.0
    pub success_rate: f64,
    pub total_pending: Money,
    pub total_expected: Money,
    pub days_detail: Vec<ForecastDay>,
}

/// Days a check has spent in its current status
fn days_in_status(check: &Check, today: NaiveDate) -> i64 {
    let start = check.created_at.date_naive();
    let end = if check.status.is_open() {
        today
    } else {
        check.updated_at.date_naive()
    };
    (end - start).num_days().max(0)
}

fn scale(amount: Money, rate: f64) -> Money {
    Money::from_minor((amount.minor() as f64 * rate).round() as i64)
}

/// Service for analytics
pub struct AnalyticsService<'a> {
    storage: &'a Storage,
}

impl<'a> AnalyticsService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    fn all_checks(&self) -> CheckdeskResult<Vec<Check>> {
        Ok(self
            .storage
            .checks()
            .list(&CheckFilter::default())?
            .into_iter()
            .map(|d| d.check)
            .collect())
    }

    /// Time spent per status, slowest status first
    pub fn aging(&self, today: NaiveDate) -> CheckdeskResult<Vec<AgingBucket>> {
        let checks = self.all_checks()?;
        let total = checks.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let mut per_status: BTreeMap<CheckStatus, Vec<i64>> = BTreeMap::new();
        for check in &checks {
            per_status
                .entry(check.status)
                .or_default()
                .push(days_in_status(check, today));
        }

        let mut buckets: Vec<AgingBucket> = per_status
            .into_iter()
            .map(|(status, days)| {
                let count = days.len();
                AgingBucket {
                    status,
                    count: count as u64,
                    avg_days: days.iter().sum::<i64>() as f64 / count as f64,
                    min_days: days.iter().copied().min().unwrap_or(0),
                    max_days: days.iter().copied().max().unwrap_or(0),
                    share: count as f64 * 100.0 / total as f64,
                }
            })
            .collect();
        buckets.sort_by(|a, b| b.avg_days.total_cmp(&a.avg_days));
        Ok(buckets)
    }

    /// Risk profiles of active clients with at least one check, riskiest first
    pub fn client_risk_profiles(&self, today: NaiveDate) -> CheckdeskResult<Vec<ClientRiskProfile>> {
        let mut by_client: HashMap<ClientId, Vec<Check>> = HashMap::new();
        for check in self.all_checks()? {
            by_client.entry(check.client_id).or_default().push(check);
        }

        let mut profiles = Vec::new();
        for client in self.storage.clients().list(None, false)? {
            let Some(checks) = by_client.get(&client.id) else {
                continue;
            };

            let total_checks = checks.len() as u64;
            let total_amount: Money = checks.iter().map(|c| c.amount).sum();
            let bounced: Vec<&Check> = checks
                .iter()
                .filter(|c| c.status == CheckStatus::Bounced)
                .collect();
            let bounce_rate = bounced.len() as f64 * 100.0 / total_checks as f64;
            let avg_processing_days = checks
                .iter()
                .map(|c| (c.updated_at - c.created_at).num_seconds() as f64 / 86_400.0)
                .sum::<f64>()
                / total_checks as f64;
            let last_bounce = bounced.iter().map(|c| c.updated_at.date_naive()).max();

            let score = risk_score(&RiskFactors {
                bounce_rate,
                total_checks,
                total_amount,
                avg_processing_days,
                days_since_last_bounce: last_bounce.map(|d| (today - d).num_days()),
            });

            profiles.push(ClientRiskProfile {
                client_id: client.id,
                client_name: client.name.clone(),
                total_checks,
                total_amount,
                bounced: bounced.len() as u64,
                bounce_rate,
                avg_processing_days,
                last_bounce,
                score,
                level: RiskLevel::from_score(score),
            });
        }

        profiles.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| b.total_amount.cmp(&a.total_amount))
        });
        Ok(profiles)
    }

    /// Cashed share of the checks closed (cashed or bounced) in the year
    /// before `today`
    pub fn historical_success_rate(&self, today: NaiveDate) -> CheckdeskResult<f64> {
        let since = today.checked_sub_days(Days::new(365)).unwrap_or(NaiveDate::MIN);
        let (mut cashed, mut closed) = (0u64, 0u64);
        for check in self.all_checks()? {
            if check.created_at.date_naive() < since {
                continue;
            }
            match check.status {
                CheckStatus::Cashed => {
                    cashed += 1;
                    closed += 1;
                }
                CheckStatus::Bounced => closed += 1,
                _ => {}
            }
        }
        Ok(if closed == 0 {
            DEFAULT_SUCCESS_RATE
        } else {
            cashed as f64 / closed as f64
        })
    }

    /// Expected collections from open checks due in the next `days` days
    pub fn forecast(&self, today: NaiveDate, days: u32) -> CheckdeskResult<CashFlowForecast> {
        let success_rate = self.historical_success_rate(today)?;
        let until = today
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX);
        let open = self
            .storage
            .checks()
            .list(&CheckFilter::open_due_between(today, until))?;

        let mut per_day: BTreeMap<NaiveDate, (u64, Money)> = BTreeMap::new();
        for details in open {
            let entry = per_day
                .entry(details.check.due_date)
                .or_insert((0, Money::zero()));
            entry.0 += 1;
            entry.1 += details.check.amount;
        }

        let mut cumulative = Money::zero();
        let mut total_pending = Money::zero();
        let days_detail = per_day
            .into_iter()
            .map(|(date, (count, amount))| {
                let expected = scale(amount, success_rate);
                cumulative += expected;
                total_pending += amount;
                ForecastDay {
                    date,
                    count,
                    amount,
                    expected,
                    cumulative,
                }
            })
            .collect();

        Ok(CashFlowForecast {
            from: today,
            days,
            success_rate,
            total_pending,
            total_expected: cumulative,
            days_detail,
        })
    }
}
