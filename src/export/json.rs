//! JSON Export functionality
//!
//! Exports the complete database to JSON format with schema versioning.
//! Password hashes are never part of an export.

use std::collections::HashSet;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CheckdeskError, CheckdeskResult};
use crate::models::{Bank, Branch, Check, Client, Notification, User};
use crate::storage::{CheckFilter, Storage};

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Full database export structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    pub banks: Vec<Bank>,
    pub branches: Vec<Branch>,
    pub clients: Vec<Client>,
    pub checks: Vec<Check>,
    pub users: Vec<User>,
    pub notifications: Vec<Notification>,

    pub metadata: ExportMetadata,
}

/// Export metadata for reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub bank_count: usize,
    pub client_count: usize,
    pub check_count: usize,
    pub user_count: usize,

    /// Due date range of the exported checks
    pub earliest_due: Option<String>,
    pub latest_due: Option<String>,
}

impl FullExport {
    /// Snapshot every table of `storage`
    pub fn from_storage(storage: &Storage) -> CheckdeskResult<Self> {
        let banks = storage.banks().list(true)?;
        let branches = storage.branches().list(None, true)?;
        let clients = storage.clients().list(None, true)?;
        let checks: Vec<Check> = storage
            .checks()
            .list(&CheckFilter::default())?
            .into_iter()
            .map(|d| d.check)
            .collect();
        let users = storage.users().list(true)?;
        let notifications = storage
            .notifications()
            .list(None, false, i64::MAX as usize)?;

        let metadata = ExportMetadata {
            bank_count: banks.len(),
            client_count: clients.len(),
            check_count: checks.len(),
            user_count: users.len(),
            earliest_due: checks.iter().map(|c| c.due_date).min().map(|d| d.to_string()),
            latest_due: checks.iter().map(|c| c.due_date).max().map(|d| d.to_string()),
        };

        Ok(Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            banks,
            branches,
            clients,
            checks,
            users,
            notifications,
            metadata,
        })
    }

    /// Check schema version and references between entities
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.schema_version
            ));
        }

        let bank_ids: HashSet<_> = self.banks.iter().map(|b| b.id).collect();
        let branch_ids: HashSet<_> = self.branches.iter().map(|b| b.id).collect();
        let client_ids: HashSet<_> = self.clients.iter().map(|c| c.id).collect();

        for branch in &self.branches {
            if !bank_ids.contains(&branch.bank_id) {
                return Err(format!(
                    "Branch {} references unknown bank {}",
                    branch.id, branch.bank_id
                ));
            }
        }

        for check in &self.checks {
            if !bank_ids.contains(&check.bank_id) {
                return Err(format!(
                    "Check {} references unknown bank {}",
                    check.id, check.bank_id
                ));
            }
            if !client_ids.contains(&check.client_id) {
                return Err(format!(
                    "Check {} references unknown client {}",
                    check.id, check.client_id
                ));
            }
            if let Some(branch_id) = check.branch_id {
                if !branch_ids.contains(&branch_id) {
                    return Err(format!(
                        "Check {} references unknown branch {}",
                        check.id, branch_id
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Export the full database to JSON
pub fn export_full_json<W: Write>(
    storage: &Storage,
    writer: &mut W,
    pretty: bool,
) -> CheckdeskResult<usize> {
    let export = FullExport::from_storage(storage)?;

    if pretty {
        serde_json::to_writer_pretty(writer, &export)
    } else {
        serde_json::to_writer(writer, &export)
    }
    .map_err(|e| CheckdeskError::Export(e.to_string()))?;

    Ok(export.metadata.check_count)
}

/// Parse and validate a JSON export
pub fn import_from_json(json_str: &str) -> CheckdeskResult<FullExport> {
    let export: FullExport =
        serde_json::from_str(json_str).map_err(|e| CheckdeskError::Import(e.to_string()))?;
    export.validate().map_err(CheckdeskError::Import)?;
    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClientKind, Money, Role};
    use chrono::NaiveDate;

    fn seeded() -> Storage {
        let storage = Storage::open_in_memory().unwrap();
        let bank = Bank::new("CIH Bank", Some("CIH".into()));
        storage.banks().insert(&bank).unwrap();
        let client = Client::new("Atlas", ClientKind::Company);
        storage.clients().insert(&client).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let check = Check::new("77", Money::from_units(10, 0), "MAD", day, day, client.id, bank.id);
        storage.checks().insert(&check).unwrap();
        let user = User::new("admin", "$argon2id$secret-hash".into(), Role::Admin);
        storage.users().insert(&user).unwrap();
        storage
    }

    #[test]
    fn test_full_export_round_trip() {
        let storage = seeded();
        let mut out = Vec::new();
        let count = export_full_json(&storage, &mut out, true).unwrap();
        assert_eq!(count, 1);

        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("secret-hash"));

        let export = import_from_json(&text).unwrap();
        assert_eq!(export.banks.len(), 1);
        assert_eq!(export.users.len(), 1);
        assert_eq!(export.metadata.earliest_due.as_deref(), Some("2024-05-01"));
    }

    #[test]
    fn test_validate_rejects_dangling_reference() {
        let storage = seeded();
        let mut export = FullExport::from_storage(&storage).unwrap();
        export.banks.clear();
        assert!(export.validate().unwrap_err().contains("unknown bank"));
    }
}
