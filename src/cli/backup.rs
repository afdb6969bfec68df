//! Backup CLI commands

use std::path::PathBuf;

use chrono::Utc;
use clap::Subcommand;
use zeroize::Zeroizing;

use crate::backup::{is_encrypted_path, BackupManager, RestoreManager};
use crate::config::paths::CheckdeskPaths;
use crate::display::format_size;
use crate::error::{CheckdeskError, CheckdeskResult};
use crate::models::Permission;

use super::{read_new_secret, read_secret, CliContext};

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Create a new backup
    Create {
        /// Encrypt the backup with a passphrase
        #[arg(short, long)]
        encrypt: bool,
        /// Read the passphrase from one line of stdin
        #[arg(long)]
        passphrase_stdin: bool,
    },

    /// List all available backups
    List {
        /// Show detailed information
        #[arg(short, long)]
        verbose: bool,
    },

    /// Restore from a backup
    Restore {
        /// Backup filename or path (use 'latest' for most recent)
        backup: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,

        #[arg(long)]
        passphrase_stdin: bool,
    },

    /// Show information about a specific backup
    Info {
        /// Backup filename or path
        backup: String,

        #[arg(long)]
        passphrase_stdin: bool,
    },

    /// Delete old backups according to retention policy
    Prune {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle a backup command
///
/// Takes the context by value so a restore can close the database first.
pub fn handle_backup_command(ctx: CliContext, cmd: BackupCommands) -> CheckdeskResult<()> {
    let manager = BackupManager::new(ctx.paths.clone(), ctx.settings.backup_retention.clone());

    match cmd {
        BackupCommands::Create {
            encrypt,
            passphrase_stdin,
        } => {
            ctx.require(Permission::SystemBackup)?;
            let passphrase = if encrypt {
                Some(read_new_secret("passphrase", passphrase_stdin)?)
            } else {
                None
            };

            println!("Creating backup...");
            let (backup_path, pruned) = manager
                .create_backup_with_retention(&ctx.storage, passphrase.as_deref().map(String::as_str))?;
            let filename = backup_path
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| backup_path.display().to_string());
            println!("Backup created: {}", filename);
            println!("Location: {}", backup_path.display());
            if !pruned.is_empty() {
                println!("Pruned {} old backup(s).", pruned.len());
            }
        }

        BackupCommands::List { verbose } => {
            ctx.require(Permission::SystemBackup)?;
            let backups = manager.list_backups()?;

            if backups.is_empty() {
                println!("No backups found.");
                println!("Create one with: checkdesk backup create");
                return Ok(());
            }

            println!("Available Backups");
            println!("=================");
            println!();

            for (i, backup) in backups.iter().enumerate() {
                let age = format_duration(Utc::now().signed_duration_since(backup.created_at));
                let mut markers = String::new();
                if backup.encrypted {
                    markers.push_str(" [encrypted]");
                }
                if backup.is_monthly {
                    markers.push_str(" [monthly]");
                }

                if verbose {
                    println!(
                        "{}. {}{}\n   Created: {}\n   Size: {}\n   Age: {}\n",
                        i + 1,
                        backup.filename,
                        markers,
                        backup.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                        format_size(backup.size_bytes),
                        age,
                    );
                } else {
                    println!(
                        "  {}. {} ({} ago, {}){}",
                        i + 1,
                        backup.filename,
                        age,
                        format_size(backup.size_bytes),
                        markers,
                    );
                }
            }

            println!();
            println!("Total: {} backup(s)", backups.len());
        }

        BackupCommands::Restore {
            backup,
            force,
            passphrase_stdin,
        } => {
            ctx.require(Permission::SystemRestore)?;
            let backup_path = resolve_backup_path(&manager, &ctx.paths, &backup)?;
            let passphrase = passphrase_for(&backup_path, passphrase_stdin)?;
            let passphrase = passphrase.as_deref().map(String::as_str);

            let restore_manager = RestoreManager::new(ctx.paths.clone());
            let validation = restore_manager.validate_backup(&backup_path, passphrase)?;

            println!("Backup Information");
            println!("==================");
            println!("File: {}", backup_path.display());
            println!("Status: {}", validation.summary());
            println!();

            if !force {
                println!("WARNING: This will overwrite ALL current data!");
                println!("To proceed, run again with --force flag:");
                println!("  checkdesk backup restore {} --force", backup);
                return Ok(());
            }

            println!("Creating backup of current data before restore...");
            let pre_restore = manager.create_backup(&ctx.storage, None)?;
            println!("Pre-restore backup saved: {}", pre_restore.display());
            println!();

            // The live connection must be closed before the file is replaced
            drop(ctx);

            println!("Restoring from backup...");
            let result = restore_manager.restore_from_file(&backup_path, passphrase)?;
            println!("Restore complete!");
            println!("{}", result.summary());
            println!("Log in again if your account is not part of the restored data.");
        }

        BackupCommands::Info {
            backup,
            passphrase_stdin,
        } => {
            ctx.require(Permission::SystemBackup)?;
            let backup_path = resolve_backup_path(&manager, &ctx.paths, &backup)?;
            let passphrase = passphrase_for(&backup_path, passphrase_stdin)?;

            let validation = RestoreManager::new(ctx.paths.clone())
                .validate_backup(&backup_path, passphrase.as_deref().map(String::as_str))?;
            let metadata = std::fs::metadata(&backup_path)?;

            println!("Backup Details");
            println!("==============");
            println!("File: {}", backup_path.display());
            println!("Size: {}", format_size(metadata.len()));
            if let Some(date) = validation.backup_date {
                println!("Created: {}", date.format("%Y-%m-%d %H:%M:%S UTC"));
            }
            println!("Schema version: {}", validation.schema_version);
            println!("Encrypted: {}", if validation.encrypted { "Yes" } else { "No" });
            println!();
            println!("Contents:");
            println!("  Banks:   {}", validation.bank_count);
            println!("  Clients: {}", validation.client_count);
            println!("  Checks:  {}", validation.check_count);
            println!("  Users:   {}", validation.user_count);
        }

        BackupCommands::Prune { force } => {
            ctx.require(Permission::SystemBackup)?;
            let backups = manager.list_backups()?;
            let retention = &ctx.settings.backup_retention;

            let (monthly, daily): (Vec<_>, Vec<_>) = backups.iter().partition(|b| b.is_monthly);
            let daily_to_delete = daily.len().saturating_sub(retention.daily_count as usize);
            let monthly_to_delete = monthly
                .len()
                .saturating_sub(retention.monthly_count as usize);
            let total_to_delete = daily_to_delete + monthly_to_delete;

            if total_to_delete == 0 {
                println!("No backups to prune.");
                println!(
                    "Current retention policy: {} daily, {} monthly",
                    retention.daily_count, retention.monthly_count
                );
                return Ok(());
            }

            println!("Prune Summary");
            println!("=============");
            println!(
                "Retention policy: {} daily, {} monthly",
                retention.daily_count, retention.monthly_count
            );
            println!(
                "To be deleted: {} daily, {} monthly ({} total)",
                daily_to_delete, monthly_to_delete, total_to_delete
            );
            println!();

            if !force {
                println!("To delete old backups, run again with --force flag:");
                println!("  checkdesk backup prune --force");
                return Ok(());
            }

            let deleted = manager.enforce_retention()?;
            println!("Deleted {} backup(s).", deleted.len());
        }
    }

    Ok(())
}

/// Prompt for a passphrase only when the backup is encrypted
fn passphrase_for(path: &std::path::Path, from_stdin: bool) -> CheckdeskResult<Option<Zeroizing<String>>> {
    if is_encrypted_path(path) {
        Ok(Some(read_secret("Backup passphrase: ", from_stdin)?))
    } else {
        Ok(None)
    }
}

/// Resolve a backup identifier to a full path
fn resolve_backup_path(
    manager: &BackupManager,
    paths: &CheckdeskPaths,
    backup: &str,
) -> CheckdeskResult<PathBuf> {
    if backup.eq_ignore_ascii_case("latest") {
        return manager
            .get_latest_backup()?
            .map(|b| b.path)
            .ok_or_else(|| CheckdeskError::NotFound {
                entity_type: "Backup",
                identifier: "latest".to_string(),
            });
    }

    let path = PathBuf::from(backup);
    if path.exists() {
        return Ok(path);
    }

    if let Some(info) = manager.get_backup(backup)? {
        return Ok(info.path);
    }

    for ext in ["db", "db.enc"] {
        let with_ext = paths.backup_dir().join(format!("{}.{}", backup, ext));
        if with_ext.exists() {
            return Ok(with_ext);
        }
    }

    Err(CheckdeskError::NotFound {
        entity_type: "Backup",
        identifier: backup.to_string(),
    })
}

/// Format a duration in human-readable form
fn format_duration(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    let days = hours / 24;
    if days < 30 {
        return format!("{}d", days);
    }

    format!("{}mo", days / 30)
}
