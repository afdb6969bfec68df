//! Notification CLI commands

use clap::Subcommand;

use crate::display::format_notification_list;
use crate::error::CheckdeskResult;
use crate::models::Permission;
use crate::services::NotificationService;

use super::CliContext;

/// Notification subcommands
#[derive(Subcommand)]
pub enum NotifyCommands {
    /// List notifications, newest first
    List {
        /// Only unread notifications
        #[arg(short, long)]
        unread: bool,
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },
    /// Create due-soon and overdue notifications for today
    Generate {
        /// Look-ahead window in days, defaults to the configured value
        #[arg(short, long)]
        days: Option<u32>,
    },
    /// Mark a notification as read
    Read { id: String },
    /// Mark every notification as read
    ReadAll,
    /// Delete a notification
    Delete { id: String },
    /// Delete notifications in bulk
    Clear {
        /// Keep unread notifications
        #[arg(long)]
        read_only: bool,
    },
}

pub fn handle_notify_command(ctx: &CliContext, cmd: NotifyCommands) -> CheckdeskResult<()> {
    let service = NotificationService::new(&ctx.storage);

    match cmd {
        NotifyCommands::List { unread, limit } => {
            let user = ctx.require(Permission::CheckRead)?;
            let notifications = service.list(Some(user.id), unread, limit)?;
            println!("{}", format_notification_list(&notifications));
            let pending = service.count_unread(Some(user.id))?;
            if pending > 0 {
                println!("{} unread", pending);
            }
        }

        NotifyCommands::Generate { days } => {
            ctx.require(Permission::CheckRead)?;
            let days = days.unwrap_or(ctx.settings.notification_days);
            let summary = service.generate_all(ctx.today(), days)?;
            println!(
                "Created {} notification(s): {} due soon, {} overdue",
                summary.total(),
                summary.due_soon,
                summary.overdue
            );
        }

        NotifyCommands::Read { id } => {
            let user = ctx.require(Permission::CheckRead)?;
            let notification = service.find(&id, Some(user.id))?;
            service.mark_read(notification.id)?;
            println!("Marked as read: {}", notification.title);
        }

        NotifyCommands::ReadAll => {
            let user = ctx.require(Permission::CheckRead)?;
            let count = service.mark_all_read(Some(user.id))?;
            println!("Marked {} notification(s) as read", count);
        }

        NotifyCommands::Delete { id } => {
            let user = ctx.require(Permission::CheckUpdate)?;
            let notification = service.find(&id, Some(user.id))?;
            service.delete(notification.id)?;
            println!("Deleted notification: {}", notification.title);
        }

        NotifyCommands::Clear { read_only } => {
            ctx.require(Permission::CheckUpdate)?;
            let removed = service.clear(read_only)?;
            println!("Removed {} notification(s)", removed);
        }
    }

    Ok(())
}
