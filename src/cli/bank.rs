//! Bank and branch CLI commands

use clap::{Args, Subcommand};

use crate::display::{format_bank_details, format_bank_list, format_branch_list};
use crate::error::{CheckdeskError, CheckdeskResult};
use crate::models::{BankId, Branch, Permission};
use crate::services::bank::BranchDetails;
use crate::services::BankService;

use super::CliContext;

/// Bank subcommands
#[derive(Subcommand)]
pub enum BankCommands {
    /// Register a bank
    Create {
        name: String,
        /// Short code, e.g. BP or AWB
        #[arg(short, long)]
        code: Option<String>,
    },
    /// List banks
    List {
        /// Include inactive banks
        #[arg(short, long)]
        all: bool,
    },
    /// Show a bank with its branches
    Show {
        /// Bank name, code or ID
        bank: String,
    },
    /// Rename a bank or change its code
    Edit {
        bank: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long, conflicts_with = "clear_code")]
        code: Option<String>,
        /// Remove the code
        #[arg(long)]
        clear_code: bool,
    },
    /// Deactivate a bank no check refers to
    #[command(alias = "remove")]
    Deactivate { bank: String },
    /// Reactivate a bank
    Reactivate { bank: String },
}

/// Contact fields shared by `branch add` and `branch edit`
#[derive(Args, Default)]
pub struct BranchFields {
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub postal_code: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
}

impl From<BranchFields> for BranchDetails {
    fn from(fields: BranchFields) -> Self {
        Self {
            address: fields.address,
            postal_code: fields.postal_code,
            phone: fields.phone,
            email: fields.email,
        }
    }
}

/// Branch subcommands
#[derive(Subcommand)]
pub enum BranchCommands {
    /// Add a branch to a bank
    Add {
        /// Bank name, code or ID
        bank: String,
        /// Branch name
        name: String,
        #[command(flatten)]
        fields: BranchFields,
    },
    /// List branches
    List {
        /// Only branches of this bank
        #[arg(short, long)]
        bank: Option<String>,
        /// Include inactive branches
        #[arg(short, long)]
        all: bool,
    },
    /// Edit a branch
    Edit {
        /// Branch name or ID
        branch: String,
        /// Bank the branch name belongs to
        #[arg(short, long)]
        bank: Option<String>,
        #[arg(short, long)]
        name: Option<String>,
        #[command(flatten)]
        fields: BranchFields,
    },
    /// Deactivate a branch
    #[command(alias = "remove")]
    Deactivate {
        branch: String,
        #[arg(short, long)]
        bank: Option<String>,
    },
}

pub fn handle_bank_command(ctx: &CliContext, cmd: BankCommands) -> CheckdeskResult<()> {
    let service = BankService::new(&ctx.storage);

    match cmd {
        BankCommands::Create { name, code } => {
            ctx.require(Permission::BankCreate)?;
            let bank = service.create(&name, code.as_deref())?;
            println!("Created bank: {}", bank.name);
            println!("  ID: {}", bank.id);
        }

        BankCommands::List { all } => {
            ctx.require(Permission::BankRead)?;
            let banks = service.list(all)?;
            let branches = service.list_branches(None, all)?;
            println!("{}", format_bank_list(&banks, &branches));
        }

        BankCommands::Show { bank } => {
            ctx.require(Permission::BankRead)?;
            let bank = service.find_required(&bank)?;
            let branches = service.list_branches(Some(bank.id), true)?;
            let check_count = ctx.storage.banks().check_count(bank.id)?;
            print!("{}", format_bank_details(&bank, &branches, check_count));
        }

        BankCommands::Edit {
            bank,
            name,
            code,
            clear_code,
        } => {
            ctx.require(Permission::BankUpdate)?;
            let found = service.find_required(&bank)?;

            let code_change = if clear_code {
                Some(None)
            } else {
                code.as_deref().map(Some)
            };
            if name.is_none() && code_change.is_none() {
                println!("No changes specified. Use --name, --code or --clear-code.");
                return Ok(());
            }

            let updated = service.update(found.id, name.as_deref(), code_change)?;
            println!("Updated bank: {}", updated.name);
        }

        BankCommands::Deactivate { bank } => {
            ctx.require(Permission::BankDelete)?;
            let found = service.find_required(&bank)?;
            let bank = service.deactivate(found.id)?;
            println!("Deactivated bank: {}", bank.name);
        }

        BankCommands::Reactivate { bank } => {
            ctx.require(Permission::BankUpdate)?;
            let found = service.find_required(&bank)?;
            let bank = service.reactivate(found.id)?;
            println!("Reactivated bank: {}", bank.name);
        }
    }

    Ok(())
}

fn bank_id(service: &BankService<'_>, bank: Option<&str>) -> CheckdeskResult<Option<BankId>> {
    bank.map(|b| service.find_required(b).map(|bank| bank.id))
        .transpose()
}

fn find_branch(
    service: &BankService<'_>,
    branch: &str,
    bank: Option<&str>,
) -> CheckdeskResult<Branch> {
    let bank_id = bank_id(service, bank)?;
    service
        .find_branch(branch, bank_id)?
        .ok_or_else(|| CheckdeskError::branch_not_found(branch))
}

pub fn handle_branch_command(ctx: &CliContext, cmd: BranchCommands) -> CheckdeskResult<()> {
    let service = BankService::new(&ctx.storage);

    match cmd {
        BranchCommands::Add { bank, name, fields } => {
            ctx.require(Permission::BankCreate)?;
            let bank = service.find_required(&bank)?;
            let branch = service.add_branch(bank.id, &name, fields.into())?;
            println!("Added branch {} to {}", branch.name, bank.name);
            println!("  ID: {}", branch.id);
        }

        BranchCommands::List { bank, all } => {
            ctx.require(Permission::BankRead)?;
            let bank_id = bank_id(&service, bank.as_deref())?;
            let branches = service.list_branches(bank_id, all)?;
            let banks = service.list(true)?;
            println!("{}", format_branch_list(&branches, &banks));
        }

        BranchCommands::Edit {
            branch,
            bank,
            name,
            fields,
        } => {
            ctx.require(Permission::BankUpdate)?;
            let found = find_branch(&service, &branch, bank.as_deref())?;
            let updated = service.update_branch(found.id, name.as_deref(), fields.into())?;
            println!("Updated branch: {}", updated.name);
        }

        BranchCommands::Deactivate { branch, bank } => {
            ctx.require(Permission::BankDelete)?;
            let found = find_branch(&service, &branch, bank.as_deref())?;
            let branch = service.deactivate_branch(found.id)?;
            println!("Deactivated branch: {}", branch.name);
        }
    }

    Ok(())
}
