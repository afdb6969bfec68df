//! Restore functionality for checkdesk
//!
//! A backup is first materialized as a staging database next to the live
//! one, checked, and only then renamed over the live database file. The
//! live database must not be held open by this process during a restore.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{info, warn};
use rusqlite::{Connection, OpenFlags};

use crate::config::paths::CheckdeskPaths;
use crate::crypto::{decrypt_with_passphrase, EncryptedData};
use crate::error::{CheckdeskError, CheckdeskResult};
use crate::storage::schema;

use super::manager::{is_encrypted_path, parse_backup_timestamp, BACKUP_PREFIX};

const SQLITE_MAGIC: &[u8] = b"SQLite format 3\0";

/// Handles restoring from backups
pub struct RestoreManager {
    paths: CheckdeskPaths,
}

impl RestoreManager {
    pub fn new(paths: CheckdeskPaths) -> Self {
        Self { paths }
    }

    /// Check that a backup can be opened and is supported by this binary
    pub fn validate_backup(
        &self,
        backup_path: &Path,
        passphrase: Option<&str>,
    ) -> CheckdeskResult<ValidationResult> {
        let staged = self.stage(backup_path, passphrase)?;
        inspect(backup_path, &staged)
    }

    /// Replace the live database with the contents of a backup
    ///
    /// Nothing is touched when the backup fails validation.
    pub fn restore_from_file(
        &self,
        backup_path: &Path,
        passphrase: Option<&str>,
    ) -> CheckdeskResult<RestoreResult> {
        let staged = self.stage(backup_path, passphrase)?;
        let validation = inspect(backup_path, &staged)?;

        let database_file = self.paths.database_file();
        fs::rename(&staged.path, &database_file).map_err(|e| {
            CheckdeskError::Io(format!("Failed to replace database file: {}", e))
        })?;

        info!(
            "event=backup_restore status=ok file={} schema_version={} checks={}",
            backup_path.display(),
            validation.schema_version,
            validation.check_count
        );
        Ok(RestoreResult {
            database_file,
            validation,
        })
    }

    /// Copy or decrypt the backup into a staging file in the data directory
    fn stage(&self, backup_path: &Path, passphrase: Option<&str>) -> CheckdeskResult<StagedDatabase> {
        let raw = fs::read(backup_path).map_err(|e| {
            CheckdeskError::Io(format!(
                "Failed to read backup {}: {}",
                backup_path.display(),
                e
            ))
        })?;

        let encrypted = !raw.starts_with(SQLITE_MAGIC);
        let plaintext = if !encrypted {
            raw
        } else if is_encrypted_path(backup_path) || raw.first() == Some(&b'{') {
            let passphrase = passphrase.ok_or_else(|| {
                CheckdeskError::Encryption("This backup is encrypted; a passphrase is required".into())
            })?;
            let envelope: EncryptedData = serde_json::from_slice(&raw).map_err(|e| {
                CheckdeskError::Encryption(format!("Invalid encrypted backup: {}", e))
            })?;
            let plaintext = decrypt_with_passphrase(&envelope, passphrase).map_err(|e| {
                warn!("event=backup_decrypt status=error file={}", backup_path.display());
                e
            })?;
            if !plaintext.starts_with(SQLITE_MAGIC) {
                return Err(CheckdeskError::Storage(
                    "Decrypted backup is not a checkdesk database".into(),
                ));
            }
            plaintext
        } else {
            return Err(CheckdeskError::Storage(format!(
                "{} is not a checkdesk backup",
                backup_path.display()
            )));
        };

        let data_dir = self.paths.data_dir();
        fs::create_dir_all(&data_dir)
            .map_err(|e| CheckdeskError::Io(format!("Failed to create data directory: {}", e)))?;
        let path = data_dir.join(format!(".restore-{}.db", uuid::Uuid::new_v4().simple()));
        let staged = StagedDatabase { path, encrypted };
        fs::write(&staged.path, plaintext)
            .map_err(|e| CheckdeskError::Io(format!("Failed to stage backup: {}", e)))?;
        Ok(staged)
    }
}

/// Staging file removed on drop unless it was renamed away
struct StagedDatabase {
    path: PathBuf,
    encrypted: bool,
}

impl Drop for StagedDatabase {
    fn drop(&mut self) {
        if self.path.exists() {
            let _ = fs::remove_file(&self.path);
        }
    }
}

fn inspect(backup_path: &Path, staged: &StagedDatabase) -> CheckdeskResult<ValidationResult> {
    let conn = Connection::open_with_flags(&staged.path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| CheckdeskError::Storage(format!("Cannot open backup: {}", e)))?;

    let integrity: String = conn
        .query_row("PRAGMA integrity_check;", [], |row| row.get(0))
        .map_err(|e| CheckdeskError::Storage(format!("Backup is corrupt: {}", e)))?;
    if integrity != "ok" {
        return Err(CheckdeskError::Storage(format!(
            "Backup failed integrity check: {}",
            integrity
        )));
    }

    let schema_version = schema::current_version(&conn)?;
    if schema_version == 0 || schema_version > schema::latest_version() {
        return Err(CheckdeskError::Storage(format!(
            "Unsupported backup schema version {} (this build supports up to {})",
            schema_version,
            schema::latest_version()
        )));
    }

    let count = |table: &str| -> CheckdeskResult<u64> {
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    };

    let backup_date = backup_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .and_then(|name| {
            let rest = name.strip_prefix(BACKUP_PREFIX)?;
            let stamp = rest.split('.').next()?;
            parse_backup_timestamp(stamp)
        })
        .or_else(|| {
            fs::metadata(backup_path)
                .and_then(|meta| meta.modified())
                .ok()
                .map(DateTime::<Utc>::from)
        });

    Ok(ValidationResult {
        schema_version,
        backup_date,
        encrypted: staged.encrypted,
        bank_count: count("banks")?,
        client_count: count("clients")?,
        check_count: count("checks")?,
        user_count: count("users")?,
    })
}

/// Result of validating a backup
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub schema_version: u32,
    pub backup_date: Option<DateTime<Utc>>,
    pub encrypted: bool,
    pub bank_count: u64,
    pub client_count: u64,
    pub check_count: u64,
    pub user_count: u64,
}

impl ValidationResult {
    /// Get a summary of what the backup holds
    pub fn summary(&self) -> String {
        let date = self
            .backup_date
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown date".to_string());
        format!(
            "Valid backup (schema v{}{}, {}): {} banks, {} clients, {} checks, {} users",
            self.schema_version,
            if self.encrypted { ", encrypted" } else { "" },
            date,
            self.bank_count,
            self.client_count,
            self.check_count,
            self.user_count
        )
    }
}

/// Result of a restore operation
#[derive(Debug, Clone)]
pub struct RestoreResult {
    pub database_file: PathBuf,
    pub validation: ValidationResult,
}

impl RestoreResult {
    pub fn summary(&self) -> String {
        format!(
            "Restored {} banks, {} clients, {} checks and {} users",
            self.validation.bank_count,
            self.validation.client_count,
            self.validation.check_count,
            self.validation.user_count
        )
    }
}
