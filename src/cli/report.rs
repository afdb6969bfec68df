//! Dashboard, analytics and report CLI commands

use std::path::PathBuf;

use chrono::{Datelike, Utc};
use clap::{Args, Subcommand};

use crate::display::{format_aging, format_dashboard, format_forecast, format_risk_profiles};
use crate::error::{CheckdeskError, CheckdeskResult};
use crate::export::{default_export_path, ExportFormat, ExportService};
use crate::models::Permission;
use crate::reports::{BankReport, ClientReport, MonthlyReport, Report, ReportRange, SummaryReport};
use crate::services::{AnalyticsService, DashboardService, NotificationService};

use super::{parse_opt_date, CliContext};

/// Analytics subcommands
#[derive(Subcommand)]
pub enum AnalyticsCommands {
    /// Open amounts grouped by days past due
    Aging,
    /// Client risk scores from bounce history and overdue checks
    Risk {
        /// Only show clients at or above this score
        #[arg(long, default_value = "0")]
        min_score: u32,
    },
    /// Expected collections over the coming days
    Forecast {
        #[arg(short, long, default_value = "30")]
        days: u32,
    },
}

/// Date range and output options shared by reports
#[derive(Args, Default)]
pub struct ReportOptions {
    /// Start date (YYYY-MM-DD), on the due date
    #[arg(long)]
    pub from: Option<String>,
    /// End date (YYYY-MM-DD), inclusive
    #[arg(long)]
    pub to: Option<String>,
    #[command(flatten)]
    pub output: ReportOutput,
}

/// Write the report to a file instead of the terminal
#[derive(Args, Default)]
pub struct ReportOutput {
    /// csv, xlsx, pdf, json or yaml
    #[arg(short, long)]
    pub export: Option<String>,
    /// Output file, defaults to a timestamped file in the exports directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Report subcommands
#[derive(Subcommand)]
pub enum ReportCommands {
    /// Totals by status, overdue and collection rate
    Summary {
        #[command(flatten)]
        options: ReportOptions,
    },
    /// Volume and bounce rate per bank
    Bank {
        #[command(flatten)]
        options: ReportOptions,
    },
    /// Volume and open amount per client
    Client {
        #[command(flatten)]
        options: ReportOptions,
    },
    /// Month by month totals for a year
    Monthly {
        /// Defaults to the current year
        #[arg(short, long)]
        year: Option<i32>,
        #[command(flatten)]
        output: ReportOutput,
    },
}

pub fn handle_dashboard(ctx: &CliContext) -> CheckdeskResult<()> {
    ctx.require(Permission::CheckRead)?;
    let today = ctx.today();
    let days = ctx.settings.notification_days;

    NotificationService::new(&ctx.storage).generate_all(today, days)?;
    let stats = DashboardService::new(&ctx.storage).stats(today, days)?;
    print!("{}", format_dashboard(&stats, &ctx.settings.company_name));
    Ok(())
}

pub fn handle_analytics_command(ctx: &CliContext, cmd: AnalyticsCommands) -> CheckdeskResult<()> {
    ctx.require(Permission::ReportGenerate)?;
    let service = AnalyticsService::new(&ctx.storage);
    let today = ctx.today();

    match cmd {
        AnalyticsCommands::Aging => print!("{}", format_aging(&service.aging(today)?)),
        AnalyticsCommands::Risk { min_score } => {
            let profiles: Vec<_> = service
                .client_risk_profiles(today)?
                .into_iter()
                .filter(|p| p.score >= min_score)
                .collect();
            print!("{}", format_risk_profiles(&profiles));
        }
        AnalyticsCommands::Forecast { days } => {
            print!("{}", format_forecast(&service.forecast(today, days)?))
        }
    }
    Ok(())
}

fn range(options: &ReportOptions) -> CheckdeskResult<ReportRange> {
    let from = parse_opt_date("start date", options.from.as_deref())?;
    let to = parse_opt_date("end date", options.to.as_deref())?;
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(CheckdeskError::Validation(
                "Start date must not be after end date".into(),
            ));
        }
    }
    Ok(ReportRange::new(from, to))
}

pub fn handle_report_command(ctx: &CliContext, cmd: ReportCommands) -> CheckdeskResult<()> {
    ctx.require(Permission::ReportGenerate)?;
    let storage = &ctx.storage;

    let (report, output) = match cmd {
        ReportCommands::Summary { options } => (
            Report::Summary(SummaryReport::generate(storage, range(&options)?, ctx.today())?),
            options.output,
        ),
        ReportCommands::Bank { options } => (
            Report::Bank(BankReport::generate(storage, range(&options)?)?),
            options.output,
        ),
        ReportCommands::Client { options } => (
            Report::Client(ClientReport::generate(storage, range(&options)?)?),
            options.output,
        ),
        ReportCommands::Monthly { year, output } => {
            let year = year.unwrap_or_else(|| ctx.today().year());
            (Report::Monthly(MonthlyReport::generate(storage, year)?), output)
        }
    };

    write_report(ctx, &report, output)
}

fn write_report(ctx: &CliContext, report: &Report, output: ReportOutput) -> CheckdeskResult<()> {
    if output.export.is_none() && output.output.is_none() {
        print!("{}", report.format_terminal());
        return Ok(());
    }

    let user = ctx.require(Permission::ReportExport)?;
    let format = resolve_format(output.export.as_deref(), output.output.as_deref(), ctx)?;
    let path = output.output.unwrap_or_else(|| {
        default_export_path(
            &ctx.paths,
            &format!("report-{}", report.kind()),
            format,
            Utc::now(),
        )
    });

    let record = ExportService::new(&ctx.storage).export_report(report, format, &path, Some(user.id))?;
    println!(
        "Exported {} report ({} rows) to {}",
        report.kind(),
        record.record_count,
        path.display()
    );
    Ok(())
}

/// Explicit format, else the output file's extension, else the configured default
pub(crate) fn resolve_format(
    format: Option<&str>,
    output: Option<&std::path::Path>,
    ctx: &CliContext,
) -> CheckdeskResult<ExportFormat> {
    match format {
        Some(name) => ExportFormat::parse(name).ok_or_else(|| {
            CheckdeskError::Validation(format!(
                "Unknown format '{}'. Use csv, xlsx, pdf, json or yaml",
                name
            ))
        }),
        None => Ok(output
            .and_then(ExportFormat::from_path)
            .unwrap_or_else(|| ctx.settings.default_export_format.into())),
    }
}
