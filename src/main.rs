use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use checkdesk::cli::{
    handle_analytics_command, handle_audit_command, handle_backup_command, handle_bank_command,
    handle_branch_command, handle_check_command, handle_client_command, handle_config_command,
    handle_dashboard, handle_export_command, handle_import, handle_init, handle_login,
    handle_logout, handle_notify_command, handle_report_command, handle_search_command,
    handle_user_command, handle_whoami, CliContext, SearchArgs,
};
use checkdesk::config::{paths::CheckdeskPaths, settings::Settings};
use checkdesk::logging::init_logging;
use checkdesk::models::Permission;

#[derive(Parser)]
#[command(
    name = "checkdesk",
    version,
    about = "Terminal-based bank check tracking",
    long_about = "checkdesk keeps track of the checks a business receives: who \
                  issued them, on which bank, when they fall due and whether \
                  they were cashed or bounced. Data lives in a local SQLite \
                  database; set CHECKDESK_DATA_DIR to use another location."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database, default banks and the first admin user
    Init {
        /// Username of the first administrator
        #[arg(long, default_value = "admin")]
        admin: String,
        /// Read the admin password from one line of stdin
        #[arg(long)]
        password_stdin: bool,
    },

    /// Start a session
    Login {
        username: String,
        #[arg(long)]
        password_stdin: bool,
    },

    /// End the current session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Bank management commands
    #[command(subcommand)]
    Bank(checkdesk::cli::BankCommands),

    /// Branch management commands
    #[command(subcommand)]
    Branch(checkdesk::cli::BranchCommands),

    /// Client management commands
    #[command(subcommand)]
    Client(checkdesk::cli::ClientCommands),

    /// Check management commands
    #[command(subcommand, alias = "cheque")]
    Check(checkdesk::cli::CheckCommands),

    /// User management commands
    #[command(subcommand)]
    User(checkdesk::cli::UserCommands),

    /// Due-date and status notifications
    #[command(subcommand, alias = "notifications")]
    Notify(checkdesk::cli::NotifyCommands),

    /// Search checks, with fuzzy text, quick filters and saved searches
    Search(SearchArgs),

    /// Overview of amounts, statuses and upcoming due dates
    Dashboard,

    /// Aging, client risk and cash-flow forecast
    #[command(subcommand)]
    Analytics(checkdesk::cli::AnalyticsCommands),

    /// Generate reports
    #[command(subcommand)]
    Report(checkdesk::cli::ReportCommands),

    /// Export checks or the whole database
    #[command(subcommand)]
    Export(checkdesk::cli::ExportCommands),

    /// Import checks from a CSV or Excel file
    Import {
        /// Path to a .csv, .xlsx, .xls or .ods file
        file: PathBuf,
    },

    /// Backup management commands
    #[command(subcommand)]
    Backup(checkdesk::cli::BackupCommands),

    /// Show the audit log
    Audit {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Only this entity type (bank, branch, client, check, user, notification)
        #[arg(short, long)]
        entity: Option<String>,
        /// Only changes made by this user
        #[arg(short, long)]
        user: Option<String>,
        /// Show before/after details
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show or change settings
    #[command(subcommand)]
    Config(checkdesk::cli::ConfigCommands),

    /// Launch the interactive TUI
    #[command(alias = "ui")]
    Tui,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let paths = CheckdeskPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    if let Err(err) = init_logging(&settings.log_level, &paths.log_dir()) {
        eprintln!("Warning: logging disabled: {}", err);
    }

    let command = match cli.command {
        Some(command) => command,
        None => {
            println!("checkdesk - Terminal-based bank check tracking");
            println!();
            println!("Run 'checkdesk init' to get started, or 'checkdesk --help' for usage.");
            println!("Run 'checkdesk tui' to launch the interactive interface.");
            return Ok(());
        }
    };

    if let Commands::Init {
        admin,
        password_stdin,
    } = &command
    {
        handle_init(&paths, &settings, admin, *password_stdin)?;
        return Ok(());
    }

    if !paths.is_initialized() {
        bail!("checkdesk is not initialized. Run 'checkdesk init' first.");
    }

    let mut ctx = CliContext::open(paths, settings)?;

    match command {
        Commands::Init { .. } => {}
        Commands::Login {
            username,
            password_stdin,
        } => handle_login(&ctx, &username, password_stdin)?,
        Commands::Logout => handle_logout(&ctx)?,
        Commands::Whoami => handle_whoami(&ctx)?,
        Commands::Bank(cmd) => handle_bank_command(&ctx, cmd)?,
        Commands::Branch(cmd) => handle_branch_command(&ctx, cmd)?,
        Commands::Client(cmd) => handle_client_command(&ctx, cmd)?,
        Commands::Check(cmd) => handle_check_command(&ctx, cmd)?,
        Commands::User(cmd) => handle_user_command(&ctx, cmd)?,
        Commands::Notify(cmd) => handle_notify_command(&ctx, cmd)?,
        Commands::Search(args) => handle_search_command(&ctx, args)?,
        Commands::Dashboard => handle_dashboard(&ctx)?,
        Commands::Analytics(cmd) => handle_analytics_command(&ctx, cmd)?,
        Commands::Report(cmd) => handle_report_command(&ctx, cmd)?,
        Commands::Export(cmd) => handle_export_command(&ctx, cmd)?,
        Commands::Import { file } => handle_import(&ctx, &file)?,
        Commands::Backup(cmd) => handle_backup_command(ctx, cmd)?,
        Commands::Audit {
            limit,
            entity,
            user,
            verbose,
        } => handle_audit_command(&ctx, limit, entity.as_deref(), user.as_deref(), verbose)?,
        Commands::Config(cmd) => handle_config_command(&mut ctx, cmd)?,
        Commands::Tui => {
            let user = ctx.require(Permission::CheckRead)?;
            checkdesk::tui::run_tui(&ctx.storage, &ctx.settings, user)?;
        }
    }

    Ok(())
}
