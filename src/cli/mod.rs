//! CLI command handlers
//!
//! Each submodule pairs a clap `Subcommand` enum with its handler. Handlers
//! receive a [`CliContext`] holding the open database, the settings and the
//! logged-in user, and check that user's permissions before acting.

pub mod audit;
pub mod auth;
pub mod backup;
pub mod bank;
pub mod check;
pub mod client;
pub mod config;
pub mod export;
pub mod notify;
pub mod report;
pub mod search;
pub mod user;

pub use audit::handle_audit_command;
pub use auth::{handle_init, handle_login, handle_logout, handle_whoami};
pub use backup::{handle_backup_command, BackupCommands};
pub use bank::{handle_bank_command, handle_branch_command, BankCommands, BranchCommands};
pub use check::{handle_check_command, CheckCommands};
pub use client::{handle_client_command, ClientCommands};
pub use config::{handle_config_command, ConfigCommands};
pub use export::{handle_export_command, handle_import, ExportCommands};
pub use notify::{handle_notify_command, NotifyCommands};
pub use report::{handle_analytics_command, handle_dashboard, handle_report_command, AnalyticsCommands, ReportCommands};
pub use search::{handle_search_command, SearchArgs};
pub use user::{handle_user_command, UserCommands};

use std::io::BufRead;

use chrono::{Local, NaiveDate, Utc};
use zeroize::Zeroizing;

use crate::config::paths::CheckdeskPaths;
use crate::config::settings::Settings;
use crate::error::{CheckdeskError, CheckdeskResult};
use crate::models::{Money, Permission, User};
use crate::services::user::require_permission;
use crate::services::SessionService;
use crate::storage::Storage;

/// Everything a command handler needs
pub struct CliContext {
    pub paths: CheckdeskPaths,
    pub settings: Settings,
    pub storage: Storage,
    user: Option<User>,
}

impl CliContext {
    /// Open the database and pick up the current session, if any
    pub fn open(paths: CheckdeskPaths, settings: Settings) -> CheckdeskResult<Self> {
        let mut storage = Storage::open(paths.clone())?;
        let user = SessionService::new(&storage, paths.session_file()).current_user(Utc::now())?;
        storage.set_actor(user.as_ref().map(|u| u.username.clone()));

        Ok(Self {
            paths,
            settings,
            storage,
            user,
        })
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// The session user, provided they hold `permission`
    pub fn require(&self, permission: Permission) -> CheckdeskResult<&User> {
        let user = self.user.as_ref().ok_or_else(|| {
            CheckdeskError::Authentication("Not logged in; run `checkdesk login` first".into())
        })?;
        require_permission(user, permission)?;
        Ok(user)
    }

    pub fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Parse `YYYY-MM-DD` (or `DD/MM/YYYY`)
pub(crate) fn parse_date(field: &str, value: &str) -> CheckdeskResult<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%d/%m/%Y"))
        .map_err(|_| {
            CheckdeskError::Validation(format!(
                "Invalid {}: '{}'. Use YYYY-MM-DD",
                field, value
            ))
        })
}

pub(crate) fn parse_opt_date(field: &str, value: Option<&str>) -> CheckdeskResult<Option<NaiveDate>> {
    value.map(|v| parse_date(field, v)).transpose()
}

pub(crate) fn parse_amount(field: &str, value: &str) -> CheckdeskResult<Money> {
    Money::parse(value).map_err(|e| {
        CheckdeskError::Validation(format!(
            "Invalid {}: '{}'. Use a format like '1500.00' or '1 500,00'. Error: {}",
            field, value, e
        ))
    })
}

/// Read a secret from the terminal, or one line of stdin for scripting
pub(crate) fn read_secret(prompt: &str, from_stdin: bool) -> CheckdeskResult<Zeroizing<String>> {
    if from_stdin {
        let mut line = Zeroizing::new(String::new());
        std::io::stdin().lock().read_line(&mut line)?;
        let trimmed = line.trim_end_matches(['\r', '\n']).to_string();
        return Ok(Zeroizing::new(trimmed));
    }

    rpassword::prompt_password(prompt)
        .map(Zeroizing::new)
        .map_err(|e| CheckdeskError::Io(format!("Failed to read password: {}", e)))
}

/// Prompt twice for a new secret; stdin input is taken as-is
pub(crate) fn read_new_secret(label: &str, from_stdin: bool) -> CheckdeskResult<Zeroizing<String>> {
    let first = read_secret(&format!("New {}: ", label), from_stdin)?;
    if from_stdin {
        return Ok(first);
    }
    let second = read_secret(&format!("Confirm {}: ", label), false)?;
    if *first != *second {
        return Err(CheckdeskError::Validation(format!("{}s do not match", label)));
    }
    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_date("due date", "2024-03-15").unwrap(), expected);
        assert_eq!(parse_date("due date", "15/03/2024").unwrap(), expected);

        let err = parse_date("due date", "March 15").unwrap_err();
        assert!(err.to_string().contains("due date"));
        assert_eq!(parse_opt_date("x", None).unwrap(), None);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(
            parse_amount("amount", "1 500,00").unwrap(),
            Money::from_units(1_500, 0)
        );
        assert!(parse_amount("amount", "abc").is_err());
        assert_eq!(
            parse_amount("amount", "1.234,50").unwrap(),
            Money::from_minor(123_450)
        );
        assert!(parse_amount("amount", "1.999").is_err());
    }
}
