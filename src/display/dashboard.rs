//! Dashboard and analytics display formatting
//!
//! Text-mode stat block with horizontal bar charts for the status split,
//! the busiest banks and the monthly volume.

use tabled::Tabled;

use crate::services::analytics::{AgingBucket, CashFlowForecast, ClientRiskProfile};
use crate::services::dashboard::DashboardStats;

use super::report::{double_separator, format_bar, format_header, format_percentage, render, separator};

const WIDTH: usize = 72;
const BAR_WIDTH: usize = 30;

pub fn format_dashboard(stats: &DashboardStats, company_name: &str) -> String {
    let mut output = String::new();

    output.push_str(&double_separator(WIDTH));
    output.push('\n');
    output.push_str(&format_header(
        &format!("{} - checks on {}", company_name, stats.today),
        WIDTH,
    ));
    output.push('\n');
    output.push_str(&double_separator(WIDTH));
    output.push('\n');

    output.push_str(&format!(
        "  Total:     {:>6} checks  {:>20}\n",
        stats.total_count,
        stats.total_amount.grouped()
    ));
    output.push_str(&format!(
        "  Overdue:   {:>6} checks  {:>20}\n",
        stats.overdue_count,
        stats.overdue_amount.grouped()
    ));
    output.push_str(&format!(
        "  Due soon:  {:>6} checks  {:>20}\n",
        stats.due_soon_count,
        stats.due_soon_amount.grouped()
    ));
    if let Some(rate) = stats.collection_rate() {
        output.push_str(&format!("  Collected: {:>6}\n", format_percentage(rate)));
    }

    output.push_str(&format!("\nBy status\n{}\n", separator(WIDTH)));
    let max_count = stats.by_status.iter().map(|s| s.count).max().unwrap_or(0) as f64;
    for total in &stats.by_status {
        output.push_str(&format!(
            "  {:<10} {} {:>5}  {:>18}\n",
            total.status.to_string(),
            format_bar(total.count as f64, max_count, BAR_WIDTH),
            total.count,
            total.amount.grouped()
        ));
    }

    if !stats.top_banks.is_empty() {
        output.push_str(&format!("\nTop banks\n{}\n", separator(WIDTH)));
        let max_amount = stats
            .top_banks
            .iter()
            .map(|b| b.amount.minor())
            .max()
            .unwrap_or(0) as f64;
        for bank in &stats.top_banks {
            output.push_str(&format!(
                "  {:<20} {} {:>18}\n",
                truncate(&bank.bank_name, 20),
                format_bar(bank.amount.minor() as f64, max_amount, BAR_WIDTH - 10),
                bank.amount.grouped()
            ));
        }
    }

    output.push_str(&format!("\nMonthly volume\n{}\n", separator(WIDTH)));
    let max_month = stats
        .monthly
        .iter()
        .map(|m| m.amount.minor())
        .max()
        .unwrap_or(0) as f64;
    for month in &stats.monthly {
        output.push_str(&format!(
            "  {:<8} {} {:>4}  {:>18}\n",
            month.month,
            format_bar(month.amount.minor() as f64, max_month, BAR_WIDTH - 6),
            month.count,
            month.amount.grouped()
        ));
    }

    output
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width - 1).collect();
        cut.push('…');
        cut
    }
}

#[derive(Tabled)]
struct AgingRow {
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Checks")]
    count: u64,
    #[tabled(rename = "Share")]
    share: String,
    #[tabled(rename = "Avg Days")]
    avg_days: String,
    #[tabled(rename = "Min")]
    min_days: i64,
    #[tabled(rename = "Max")]
    max_days: i64,
}

#[derive(Tabled)]
struct RiskRow {
    #[tabled(rename = "Client")]
    client: String,
    #[tabled(rename = "Checks")]
    checks: u64,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Bounced")]
    bounced: u64,
    #[tabled(rename = "Bounce Rate")]
    bounce_rate: String,
    #[tabled(rename = "Last Bounce")]
    last_bounce: String,
    #[tabled(rename = "Score")]
    score: u32,
    #[tabled(rename = "Risk")]
    level: String,
}

#[derive(Tabled)]
struct ForecastRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Checks")]
    count: u64,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Expected")]
    expected: String,
    #[tabled(rename = "Cumulative")]
    cumulative: String,
}

/// Age of checks per status
pub fn format_aging(buckets: &[AgingBucket]) -> String {
    if buckets.is_empty() {
        return "No checks to analyze.".to_string();
    }

    let rows = buckets
        .iter()
        .map(|b| AgingRow {
            status: b.status.to_string(),
            count: b.count,
            share: format_percentage(b.share),
            avg_days: format!("{:.1}", b.avg_days),
            min_days: b.min_days,
            max_days: b.max_days,
        })
        .collect();
    render(rows, &[1, 2, 3, 4, 5])
}

pub fn format_risk_profiles(profiles: &[ClientRiskProfile]) -> String {
    if profiles.is_empty() {
        return "No client activity to score.".to_string();
    }

    let rows = profiles
        .iter()
        .map(|p| RiskRow {
            client: p.client_name.clone(),
            checks: p.total_checks,
            amount: p.total_amount.grouped(),
            bounced: p.bounced,
            bounce_rate: format_percentage(p.bounce_rate),
            last_bounce: p
                .last_bounce
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
            score: p.score,
            level: p.level.to_string(),
        })
        .collect();
    render(rows, &[1, 2, 3, 4, 6])
}

pub fn format_forecast(forecast: &CashFlowForecast) -> String {
    let mut output = format!(
        "Cash-flow forecast: {} days from {} (success rate {})\n",
        forecast.days,
        forecast.from,
        format_percentage(forecast.success_rate * 100.0)
    );

    if forecast.days_detail.is_empty() {
        output.push_str("No open checks fall due in this window.\n");
    } else {
        let rows = forecast
            .days_detail
            .iter()
            .map(|d| ForecastRow {
                date: d.date.to_string(),
                count: d.count,
                amount: d.amount.grouped(),
                expected: d.expected.grouped(),
                cumulative: d.cumulative.grouped(),
            })
            .collect();
        output.push_str(&render(rows, &[1, 2, 3, 4]));
        output.push('\n');
    }

    output.push_str(&format!(
        "Pending {}  Expected {}\n",
        forecast.total_pending.grouped(),
        forecast.total_expected.grouped()
    ));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CheckStatus, Money};
    use crate::storage::checks::{BankTotal, MonthTotal, StatusTotal};
    use chrono::NaiveDate;

    #[test]
    fn test_format_dashboard() {
        let stats = DashboardStats {
            today: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            total_count: 3,
            total_amount: Money::from_units(4_500, 0),
            by_status: CheckStatus::ALL
                .iter()
                .map(|&status| StatusTotal {
                    status,
                    count: u64::from(status == CheckStatus::Pending) * 3,
                    amount: Money::zero(),
                })
                .collect(),
            overdue_count: 1,
            overdue_amount: Money::from_units(500, 0),
            due_soon_count: 0,
            due_soon_amount: Money::zero(),
            top_banks: vec![BankTotal {
                bank_id: crate::models::BankId::new(),
                bank_name: "Banque Populaire".into(),
                count: 3,
                amount: Money::from_units(4_500, 0),
            }],
            monthly: vec![MonthTotal {
                month: "2024-03".into(),
                count: 3,
                amount: Money::from_units(4_500, 0),
            }],
        };

        let output = format_dashboard(&stats, "Acme");
        assert!(output.contains("Acme - checks on 2024-03-10"));
        assert!(output.contains("4 500.00"));
        assert!(output.contains("Banque Populaire"));
        assert!(output.contains("2024-03"));
        assert!(!output.contains("Collected"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Attijariwafa Bank", 8).chars().count(), 8);
    }
}
