//! Export and import CLI commands

use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::Subcommand;

use crate::display::{format_export_history, format_import_result, format_size};
use crate::error::{CheckdeskError, CheckdeskResult};
use crate::export::{default_export_path, ExportFormat, ExportService};
use crate::models::Permission;
use crate::services::ImportService;

use super::report::resolve_format;
use super::search::FilterArgs;
use super::CliContext;

/// Export subcommands
#[derive(Subcommand)]
pub enum ExportCommands {
    /// Export the checks matching a filter
    Checks {
        #[command(flatten)]
        filter: FilterArgs,
        /// csv, xlsx, pdf, json or yaml
        #[arg(short, long)]
        format: Option<String>,
        /// Output file, defaults to a timestamped file in the exports directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Dump every bank, client, check and user
    Full {
        /// json or yaml
        #[arg(short, long, default_value = "json")]
        format: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show recently written exports
    History {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

pub fn handle_export_command(ctx: &CliContext, cmd: ExportCommands) -> CheckdeskResult<()> {
    let service = ExportService::new(&ctx.storage);

    match cmd {
        ExportCommands::Checks {
            filter,
            format,
            output,
        } => {
            let user = ctx.require(Permission::ReportExport)?;
            let format = resolve_format(format.as_deref(), output.as_deref(), ctx)?;
            let filter = filter.to_filter(&ctx.storage)?;
            let path = output
                .unwrap_or_else(|| default_export_path(&ctx.paths, "checks", format, Utc::now()));

            let record = service.export_checks(&filter, format, &path, Some(user.id))?;
            println!(
                "Exported {} check(s) to {} ({})",
                record.record_count,
                path.display(),
                format_size(record.file_size)
            );
        }

        ExportCommands::Full { format, output } => {
            let user = ctx.require(Permission::SystemBackup)?;
            let format = match ExportFormat::parse(&format) {
                Some(f @ (ExportFormat::Json | ExportFormat::Yaml)) => f,
                _ => {
                    return Err(CheckdeskError::Validation(format!(
                        "Unknown full export format '{}'. Use json or yaml",
                        format
                    )))
                }
            };
            let path = output
                .unwrap_or_else(|| default_export_path(&ctx.paths, "checkdesk", format, Utc::now()));

            let record = service.export_full(format, &path, Some(user.id))?;
            println!(
                "Exported {} record(s) to {} ({})",
                record.record_count,
                path.display(),
                format_size(record.file_size)
            );
        }

        ExportCommands::History { limit } => {
            ctx.require(Permission::ReportExport)?;
            println!("{}", format_export_history(&service.history(limit)?));
        }
    }

    Ok(())
}

/// Import checks from a CSV or Excel file
pub fn handle_import(ctx: &CliContext, file: &Path) -> CheckdeskResult<()> {
    let user = ctx.require(Permission::CheckCreate)?;
    ctx.require(Permission::ClientCreate)?;

    let result = ImportService::new(&ctx.storage).import_file(file, Some(user.id))?;
    println!("{}", format_import_result(&result));
    Ok(())
}
