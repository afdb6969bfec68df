//! Check CLI commands

use clap::Subcommand;

use crate::display::{
    format_check_details, format_check_list, format_duplicate_matches, format_duplicate_pairs,
};
use crate::error::{CheckdeskError, CheckdeskResult};
use crate::models::{BankId, BranchId, ClientId, Permission};
use crate::services::check::{CheckUpdate, NewCheck};
use crate::services::client::ClientFields;
use crate::services::{BankService, CheckService, ClientService};

use super::search::{parse_status, FilterArgs};
use super::{parse_amount, parse_date, parse_opt_date, CliContext};

/// Check subcommands
#[derive(Subcommand)]
pub enum CheckCommands {
    /// Record a received check
    Add {
        /// Check number as printed
        number: String,
        /// Amount, e.g. "1500.00" or "1 500,00"
        amount: String,
        /// Client name or ID
        #[arg(short, long)]
        client: String,
        /// Bank name, code or ID
        #[arg(short, long)]
        bank: String,
        /// Branch name or ID
        #[arg(long)]
        branch: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(short, long)]
        due: String,
        /// Issue date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        issued: Option<String>,
        /// Currency code, defaults to the configured currency
        #[arg(long)]
        currency: Option<String>,
        /// Person who handed the check over
        #[arg(long)]
        depositor: Option<String>,
        #[arg(long)]
        invoice: Option<String>,
        #[arg(long)]
        invoice_date: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
        /// Create the client if no client has this name
        #[arg(long)]
        new_client: bool,
        /// Record even when a similar check exists
        #[arg(short, long)]
        force: bool,
    },
    /// List checks
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Show check details
    Show {
        /// Check number or ID
        check: String,
    },
    /// Edit check fields
    Edit {
        check: String,
        #[arg(long)]
        number: Option<String>,
        #[arg(long)]
        amount: Option<String>,
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        bank: Option<String>,
        #[arg(long, conflicts_with = "clear_branch")]
        branch: Option<String>,
        #[arg(long)]
        clear_branch: bool,
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        issued: Option<String>,
        #[arg(long)]
        currency: Option<String>,
        #[arg(long)]
        depositor: Option<String>,
        #[arg(long)]
        invoice: Option<String>,
        #[arg(long)]
        invoice_date: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Change the status of a check
    Status {
        check: String,
        /// pending, deposited, cashed, bounced or cancelled
        status: String,
    },
    /// Delete a check permanently
    Delete {
        check: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Find likely duplicates of one check, or across all checks
    Duplicates { check: Option<String> },
}

fn resolve_bank(ctx: &CliContext, bank: &str) -> CheckdeskResult<BankId> {
    Ok(BankService::new(&ctx.storage).find_required(bank)?.id)
}

fn resolve_branch(ctx: &CliContext, branch: &str, bank_id: BankId) -> CheckdeskResult<BranchId> {
    BankService::new(&ctx.storage)
        .find_branch(branch, Some(bank_id))?
        .map(|b| b.id)
        .ok_or_else(|| CheckdeskError::branch_not_found(branch))
}

fn resolve_client(ctx: &CliContext, client: &str, create: bool) -> CheckdeskResult<ClientId> {
    let service = ClientService::new(&ctx.storage);
    if create {
        Ok(service.find_or_create(client, ClientFields::default())?.id)
    } else {
        Ok(service.find_required(client)?.id)
    }
}

pub fn handle_check_command(ctx: &CliContext, cmd: CheckCommands) -> CheckdeskResult<()> {
    let service = CheckService::new(&ctx.storage);
    let today = ctx.today();

    match cmd {
        CheckCommands::Add {
            number,
            amount,
            client,
            bank,
            branch,
            due,
            issued,
            currency,
            depositor,
            invoice,
            invoice_date,
            notes,
            new_client,
            force,
        } => {
            let user = ctx.require(Permission::CheckCreate)?;
            if new_client {
                ctx.require(Permission::ClientCreate)?;
            }

            let amount = parse_amount("amount", &amount)?;
            let due_date = parse_date("due date", &due)?;
            let issue_date = parse_opt_date("issue date", issued.as_deref())?.unwrap_or(today);
            let bank_id = resolve_bank(ctx, &bank)?;
            let client_id = resolve_client(ctx, &client, new_client)?;

            let mut draft = NewCheck::new(number, amount, issue_date, due_date, client_id, bank_id);
            draft.currency = currency.unwrap_or_else(|| ctx.settings.default_currency.clone());
            draft.branch_id = branch
                .as_deref()
                .map(|b| resolve_branch(ctx, b, bank_id))
                .transpose()?;
            draft.depositor_name = depositor.unwrap_or_default();
            draft.invoice_number = invoice.unwrap_or_default();
            draft.invoice_date = parse_opt_date("invoice date", invoice_date.as_deref())?;
            draft.notes = notes.unwrap_or_default();

            if !force {
                let matches = service.detect_duplicates(&draft.preview())?;
                if !matches.is_empty() {
                    println!("This check resembles existing checks:");
                    println!("{}", format_duplicate_matches(&matches));
                    println!("Run again with --force to record it anyway.");
                    return Ok(());
                }
            }

            let check = service.create(draft, Some(user.id))?;
            println!("Recorded check {}", check.number);
            println!("  Amount: {}", check.amount.format_with_symbol(&check.currency));
            println!("  Due:    {}", check.due_date);
            println!("  ID:     {}", check.id);
        }

        CheckCommands::List { filter } => {
            ctx.require(Permission::CheckRead)?;
            let filter = filter.to_filter(&ctx.storage)?;
            println!("{}", format_check_list(&service.list(&filter)?, today));
        }

        CheckCommands::Show { check } => {
            ctx.require(Permission::CheckRead)?;
            let found = service.find_required(&check)?;
            print!("{}", format_check_details(&service.get_details(found.id)?, today));
        }

        CheckCommands::Edit {
            check,
            number,
            amount,
            client,
            bank,
            branch,
            clear_branch,
            due,
            issued,
            currency,
            depositor,
            invoice,
            invoice_date,
            notes,
        } => {
            ctx.require(Permission::CheckUpdate)?;
            let found = service.find_required(&check)?;

            let bank_id = bank.as_deref().map(|b| resolve_bank(ctx, b)).transpose()?;
            let branch_id = if clear_branch {
                Some(None)
            } else {
                branch
                    .as_deref()
                    .map(|b| resolve_branch(ctx, b, bank_id.unwrap_or(found.bank_id)).map(Some))
                    .transpose()?
            };

            let changes = CheckUpdate {
                number,
                amount: amount.as_deref().map(|a| parse_amount("amount", a)).transpose()?,
                currency,
                issue_date: parse_opt_date("issue date", issued.as_deref())?,
                due_date: parse_opt_date("due date", due.as_deref())?,
                client_id: client
                    .as_deref()
                    .map(|c| resolve_client(ctx, c, false))
                    .transpose()?,
                bank_id,
                branch_id,
                depositor_name: depositor,
                invoice_number: invoice,
                invoice_date: parse_opt_date("invoice date", invoice_date.as_deref())?.map(Some),
                notes,
            };
            if changes.is_empty() {
                println!("No changes specified.");
                return Ok(());
            }

            let updated = service.update(found.id, changes)?;
            println!("Updated check {}", updated.number);
        }

        CheckCommands::Status { check, status } => {
            let user = ctx.require(Permission::CheckUpdate)?;
            let status = parse_status(&status)?;
            let found = service.find_required(&check)?;
            let updated = service.change_status(found.id, status, Some(user.id))?;
            println!("Check {} is now {}", updated.number, updated.status);
        }

        CheckCommands::Delete { check, force } => {
            ctx.require(Permission::CheckDelete)?;
            let found = service.find_required(&check)?;
            if !force {
                println!(
                    "This will permanently delete check {} ({}).",
                    found.number,
                    found.amount.grouped()
                );
                println!("Run again with --force to confirm.");
                return Ok(());
            }
            let deleted = service.delete(found.id)?;
            println!("Deleted check {}", deleted.number);
        }

        CheckCommands::Duplicates { check } => {
            ctx.require(Permission::CheckRead)?;
            match check {
                Some(check) => {
                    let found = service.find_required(&check)?;
                    println!("{}", format_duplicate_matches(&service.detect_duplicates(&found)?));
                }
                None => print!("{}", format_duplicate_pairs(&service.scan_duplicates()?)),
            }
        }
    }

    Ok(())
}
