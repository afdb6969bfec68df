//! Check filters shared by `check list`, `search` and `export`, plus the
//! `search` command with fuzzy matching, quick filters and saved searches

use clap::Args;

use crate::display::format_check_list;
use crate::error::{CheckdeskError, CheckdeskResult};
use crate::models::{CheckStatus, Permission};
use crate::services::search::QuickFilter;
use crate::services::{BankService, ClientService, SearchService};
use crate::storage::{CheckFilter, CheckSort, Storage};

use super::{parse_amount, parse_opt_date, CliContext};

/// Structured check filter options
#[derive(Args, Default, Clone)]
pub struct FilterArgs {
    /// Status (repeatable): pending, deposited, cashed, bounced, cancelled
    #[arg(short, long = "status")]
    pub statuses: Vec<String>,
    /// Bank name, code or ID
    #[arg(short, long)]
    pub bank: Option<String>,
    /// Branch name or ID
    #[arg(long)]
    pub branch: Option<String>,
    /// Client name or ID
    #[arg(short, long)]
    pub client: Option<String>,
    /// Due on or after (YYYY-MM-DD)
    #[arg(long)]
    pub due_from: Option<String>,
    /// Due on or before (YYYY-MM-DD)
    #[arg(long)]
    pub due_to: Option<String>,
    #[arg(long)]
    pub issued_from: Option<String>,
    #[arg(long)]
    pub issued_to: Option<String>,
    /// Minimum amount
    #[arg(long)]
    pub min: Option<String>,
    /// Maximum amount
    #[arg(long)]
    pub max: Option<String>,
    /// Substring of number, client, bank, invoice or notes
    #[arg(short, long)]
    pub text: Option<String>,
    /// Sort order: due, issue, amount, number, created
    #[arg(long, default_value = "due")]
    pub sort: String,
    /// Maximum number of checks
    #[arg(short, long)]
    pub limit: Option<usize>,
}

impl FilterArgs {
    /// Resolve names to ids and parse dates and amounts
    pub fn to_filter(&self, storage: &Storage) -> CheckdeskResult<CheckFilter> {
        let statuses = self
            .statuses
            .iter()
            .map(|s| parse_status(s))
            .collect::<CheckdeskResult<Vec<_>>>()?;

        let banks = BankService::new(storage);
        let bank_id = self
            .bank
            .as_deref()
            .map(|b| banks.find_required(b).map(|bank| bank.id))
            .transpose()?;
        let branch_id = match self.branch.as_deref() {
            Some(branch) => Some(
                banks
                    .find_branch(branch, bank_id)?
                    .ok_or_else(|| CheckdeskError::branch_not_found(branch))?
                    .id,
            ),
            None => None,
        };
        let client_id = self
            .client
            .as_deref()
            .map(|c| ClientService::new(storage).find_required(c).map(|client| client.id))
            .transpose()?;

        let sort = CheckSort::parse(&self.sort).ok_or_else(|| {
            CheckdeskError::Validation(format!(
                "Invalid sort: '{}'. Valid: due, issue, amount, number, created",
                self.sort
            ))
        })?;

        Ok(CheckFilter {
            statuses,
            bank_id,
            branch_id,
            client_id,
            due_from: parse_opt_date("due-from", self.due_from.as_deref())?,
            due_to: parse_opt_date("due-to", self.due_to.as_deref())?,
            issue_from: parse_opt_date("issued-from", self.issued_from.as_deref())?,
            issue_to: parse_opt_date("issued-to", self.issued_to.as_deref())?,
            min_amount: self.min.as_deref().map(|v| parse_amount("min", v)).transpose()?,
            max_amount: self.max.as_deref().map(|v| parse_amount("max", v)).transpose()?,
            text: self.text.clone().filter(|t| !t.trim().is_empty()),
            sort,
            limit: self.limit,
        })
    }
}

pub(crate) fn parse_status(value: &str) -> CheckdeskResult<CheckStatus> {
    CheckStatus::parse(value).ok_or_else(|| {
        CheckdeskError::Validation(format!(
            "Invalid status: '{}'. Valid: pending, deposited, cashed, bounced, cancelled",
            value
        ))
    })
}

/// `search` arguments
#[derive(Args)]
pub struct SearchArgs {
    /// Fuzzy text matched against number, client, bank and notes
    pub query: Option<String>,
    /// Quick filter: today, week, month, overdue, due:N, a status, amount:MIN-MAX
    ///
    /// Relative to today, so it cannot be saved.
    #[arg(short, long, conflicts_with_all = ["query", "save"])]
    pub quick: Option<String>,
    #[command(flatten)]
    pub filter: FilterArgs,
    /// Save this search under a name
    #[arg(long)]
    pub save: Option<String>,
    /// Run a saved search
    #[arg(long, conflicts_with_all = ["query", "quick", "save"])]
    pub run: Option<String>,
    /// List saved searches
    #[arg(long)]
    pub list_saved: bool,
    /// Delete a saved search
    #[arg(long)]
    pub forget: Option<String>,
}

pub fn handle_search_command(ctx: &CliContext, args: SearchArgs) -> CheckdeskResult<()> {
    ctx.require(Permission::CheckRead)?;
    let service = SearchService::new(&ctx.storage, ctx.paths.saved_searches_file());
    let today = ctx.today();

    if args.list_saved {
        let saved = service.list_saved()?;
        if saved.is_empty() {
            println!("No saved searches.");
        }
        for search in saved {
            let used = search
                .last_used
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "never".to_string());
            match search.fuzzy {
                Some(query) => println!("  {} (\"{}\", last used {})", search.name, query, used),
                None => println!("  {} (last used {})", search.name, used),
            }
        }
        return Ok(());
    }
    if let Some(name) = args.forget.as_deref() {
        if service.delete_saved(name)? {
            println!("Deleted saved search: {}", name);
        } else {
            println!("No saved search named '{}'.", name);
        }
        return Ok(());
    }
    if let Some(name) = args.run.as_deref() {
        let results = service.run_saved(name)?;
        println!("{}", format_check_list(&results, today));
        return Ok(());
    }

    let results = if let Some(quick) = args.quick.as_deref() {
        let quick = QuickFilter::parse(quick).ok_or_else(|| {
            CheckdeskError::Validation(format!("Unknown quick filter: '{}'", quick))
        })?;
        service.quick(quick, today)?
    } else {
        let filter = args.filter.to_filter(&ctx.storage)?;
        let results = match args.query.as_deref() {
            Some(query) => service.fuzzy_search(query, &filter)?,
            None => service.search(&filter)?,
        };
        if let Some(name) = args.save.as_deref() {
            service.save(name, filter, args.query.clone())?;
            println!("Saved search: {}", name);
        }
        results
    };

    println!("{}", format_check_list(&results, today));
    Ok(())
}
