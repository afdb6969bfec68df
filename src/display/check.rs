//! Check display formatting
//!
//! List rows carry a "Due" column relative to `today`: `in 3d`, `today`,
//! or `5d late` for open checks past their due date.

use chrono::NaiveDate;
use tabled::Tabled;

use crate::models::{CheckDetails, Money};
use crate::services::check::{DuplicateMatch, DuplicatePair};

use super::report::{or_dash, render};

#[derive(Tabled)]
struct CheckRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Number")]
    number: String,
    #[tabled(rename = "Client")]
    client: String,
    #[tabled(rename = "Bank")]
    bank: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Due Date")]
    due_date: String,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct DuplicateRow {
    #[tabled(rename = "Score")]
    score: u32,
    #[tabled(rename = "Number")]
    number: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Due Date")]
    due_date: String,
    #[tabled(rename = "Reasons")]
    reasons: String,
}

/// Relative due label; closed checks get none
pub fn due_label(details: &CheckDetails, today: NaiveDate) -> String {
    let check = &details.check;
    if !check.status.is_open() {
        return String::new();
    }
    match check.days_until_due(today) {
        0 => "today".to_string(),
        days if days > 0 => format!("in {}d", days),
        days => format!("{}d late", -days),
    }
}

pub fn format_check_list(checks: &[CheckDetails], today: NaiveDate) -> String {
    if checks.is_empty() {
        return "No checks found.".to_string();
    }

    let rows = checks
        .iter()
        .map(|details| {
            let check = &details.check;
            CheckRow {
                id: check.id.to_string(),
                number: check.number.clone(),
                client: details.client_name.clone(),
                bank: details.bank_name.clone(),
                amount: check.amount.grouped(),
                due_date: check.due_date.to_string(),
                due: due_label(details, today),
                status: check.status.to_string(),
            }
        })
        .collect();

    let total: Money = checks.iter().map(|d| d.check.amount).sum();
    format!(
        "{}\n{} check(s), total {}\n",
        render(rows, &[4]),
        checks.len(),
        total.grouped()
    )
}

pub fn format_check_details(details: &CheckDetails, today: NaiveDate) -> String {
    let check = &details.check;
    let mut output = String::new();

    output.push_str(&format!("Check {}\n", check.number));
    output.push_str(&format!("  ID:          {}\n", check.id));
    output.push_str(&format!(
        "  Amount:      {}\n",
        check.amount.format_with_symbol(&check.currency)
    ));
    output.push_str(&format!("  Status:      {}\n", check.status));
    output.push_str(&format!("  Client:      {}\n", details.client_name));
    output.push_str(&format!("  Bank:        {}\n", details.bank_name));
    output.push_str(&format!(
        "  Branch:      {}\n",
        details.branch_name.as_deref().unwrap_or("-")
    ));
    output.push_str(&format!("  Issued:      {}\n", check.issue_date));
    let due = due_label(details, today);
    if due.is_empty() {
        output.push_str(&format!("  Due:         {}\n", check.due_date));
    } else {
        output.push_str(&format!("  Due:         {} ({})\n", check.due_date, due));
    }
    output.push_str(&format!("  Depositor:   {}\n", or_dash(&check.depositor_name)));
    output.push_str(&format!("  Invoice:     {}", or_dash(&check.invoice_number)));
    if let Some(date) = check.invoice_date {
        output.push_str(&format!(" ({})", date));
    }
    output.push('\n');
    if !check.notes.is_empty() {
        output.push_str(&format!("  Notes:       {}\n", check.notes));
    }
    output.push_str(&format!(
        "  Updated:     {}\n",
        check.updated_at.format("%Y-%m-%d %H:%M")
    ));
    output
}

/// Possible duplicates of one check
pub fn format_duplicate_matches(matches: &[DuplicateMatch]) -> String {
    if matches.is_empty() {
        return "No likely duplicates.".to_string();
    }

    let rows = matches
        .iter()
        .map(|m| DuplicateRow {
            score: m.score,
            number: m.check.number.clone(),
            amount: m.check.amount.grouped(),
            due_date: m.check.due_date.to_string(),
            reasons: m.reasons.join(", "),
        })
        .collect();
    render(rows, &[0, 2])
}

/// Duplicate pairs found across the whole book
pub fn format_duplicate_pairs(pairs: &[DuplicatePair]) -> String {
    if pairs.is_empty() {
        return "No likely duplicates.".to_string();
    }

    let mut output = String::new();
    for pair in pairs {
        output.push_str(&format!(
            "[{}] {} ({}) <-> {} ({}): {}\n",
            pair.score,
            pair.first.number,
            pair.first.amount.grouped(),
            pair.second.number,
            pair.second.amount.grouped(),
            pair.reasons.join(", ")
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BankId, Check, CheckStatus, ClientId};

    fn details(status: CheckStatus, due: NaiveDate) -> CheckDetails {
        let mut check = Check::new(
            "1234567",
            Money::from_units(1_500, 0),
            "MAD",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            due,
            ClientId::new(),
            BankId::new(),
        );
        check.status = status;
        CheckDetails {
            check,
            client_name: "Atlas SARL".into(),
            bank_name: "Banque Populaire".into(),
            branch_name: None,
        }
    }

    #[test]
    fn test_due_label() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let due = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();

        assert_eq!(due_label(&details(CheckStatus::Pending, due(13)), today), "in 3d");
        assert_eq!(due_label(&details(CheckStatus::Pending, due(10)), today), "today");
        assert_eq!(due_label(&details(CheckStatus::Deposited, due(5)), today), "5d late");
        assert_eq!(due_label(&details(CheckStatus::Cashed, due(5)), today), "");
    }

    #[test]
    fn test_check_list_total() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let due = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        let rows = vec![details(CheckStatus::Pending, due), details(CheckStatus::Pending, due)];

        let output = format_check_list(&rows, today);
        assert!(output.contains("Atlas SARL"));
        assert!(output.contains("2 check(s), total 3 000.00"));
        assert_eq!(format_check_list(&[], today), "No checks found.");
    }

    #[test]
    fn test_check_details() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let output = format_check_details(
            &details(CheckStatus::Pending, NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()),
            today,
        );
        assert!(output.contains("Check 1234567"));
        assert!(output.contains("(in 2d)"));
        assert!(output.contains("Branch:      -"));
    }
}
