//! Bank and branch display formatting

use std::collections::HashMap;

use tabled::Tabled;

use crate::models::{Bank, BankId, Branch};

use super::report::{or_dash, render};

#[derive(Tabled)]
struct BankRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Branches")]
    branches: usize,
    #[tabled(rename = "Status")]
    status: &'static str,
}

#[derive(Tabled)]
struct BranchRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Bank")]
    bank: String,
    #[tabled(rename = "Branch")]
    name: String,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "Address")]
    address: String,
}

fn status_label(active: bool) -> &'static str {
    if active {
        "Active"
    } else {
        "Inactive"
    }
}

/// Banks with their branch counts
pub fn format_bank_list(banks: &[Bank], branches: &[Branch]) -> String {
    if banks.is_empty() {
        return "No banks found.".to_string();
    }

    let rows = banks
        .iter()
        .map(|bank| BankRow {
            id: bank.id.to_string(),
            name: bank.name.clone(),
            code: bank.code.clone().unwrap_or_else(|| "-".into()),
            branches: branches.iter().filter(|b| b.bank_id == bank.id).count(),
            status: status_label(bank.active),
        })
        .collect();
    render(rows, &[3])
}

/// Branches, with the owning bank looked up in `banks`
pub fn format_branch_list(branches: &[Branch], banks: &[Bank]) -> String {
    if branches.is_empty() {
        return "No branches found.".to_string();
    }

    let names: HashMap<BankId, &str> = banks.iter().map(|b| (b.id, b.name.as_str())).collect();
    let rows = branches
        .iter()
        .map(|branch| BranchRow {
            id: branch.id.to_string(),
            bank: names.get(&branch.bank_id).copied().unwrap_or("?").to_string(),
            name: if branch.active {
                branch.name.clone()
            } else {
                format!("{} (inactive)", branch.name)
            },
            phone: or_dash(&branch.phone).to_string(),
            address: or_dash(&branch.address).to_string(),
        })
        .collect();
    render(rows, &[])
}

pub fn format_bank_details(bank: &Bank, branches: &[Branch], check_count: u64) -> String {
    let mut output = String::new();
    output.push_str(&format!("Bank: {}\n", bank.name));
    output.push_str(&format!("  ID:       {}\n", bank.id));
    output.push_str(&format!(
        "  Code:     {}\n",
        bank.code.as_deref().unwrap_or("-")
    ));
    output.push_str(&format!("  Status:   {}\n", status_label(bank.active)));
    output.push_str(&format!("  Checks:   {}\n", check_count));
    output.push_str(&format!(
        "  Created:  {}\n",
        bank.created_at.format("%Y-%m-%d")
    ));

    if !branches.is_empty() {
        output.push_str("  Branches:\n");
        for branch in branches {
            output.push_str(&format!(
                "    - {}{}\n",
                branch.name,
                if branch.active { "" } else { " (inactive)" }
            ));
        }
    }
    output
}
