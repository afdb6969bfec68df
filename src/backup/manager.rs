//! Backup manager for checkdesk
//!
//! Snapshots the SQLite database into the backup directory with `VACUUM INTO`
//! and applies the daily/monthly retention policy. A snapshot may be sealed
//! with a passphrase, in which case the `.db.enc` file holds the encrypted
//! database as a JSON envelope.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::config::paths::CheckdeskPaths;
use crate::config::settings::BackupRetention;
use crate::crypto::encryption::encrypt_with_params;
use crate::crypto::KeyDerivationParams;
use crate::error::{CheckdeskError, CheckdeskResult};
use crate::storage::Storage;

pub(crate) const BACKUP_PREFIX: &str = "backup-";
pub(crate) const PLAIN_SUFFIX: &str = ".db";
pub(crate) const ENCRYPTED_SUFFIX: &str = ".db.enc";

/// Metadata about a backup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupInfo {
    pub filename: String,
    pub path: PathBuf,
    /// Taken from the filename
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub encrypted: bool,
    /// First backup of its calendar month, kept under the monthly quota
    pub is_monthly: bool,
}

/// Manages backup creation and retention
pub struct BackupManager {
    backup_dir: PathBuf,
    retention: BackupRetention,
    kdf: Option<KeyDerivationParams>,
}

impl BackupManager {
    pub fn new(paths: CheckdeskPaths, retention: BackupRetention) -> Self {
        Self {
            backup_dir: paths.backup_dir(),
            retention,
            kdf: None,
        }
    }

    /// Use fixed key derivation parameters instead of fresh ones per backup
    #[cfg(test)]
    pub(crate) fn with_kdf(mut self, kdf: KeyDerivationParams) -> Self {
        self.kdf = Some(kdf);
        self
    }

    /// Snapshot the database behind `storage`
    ///
    /// With a passphrase the snapshot is encrypted and only the `.db.enc`
    /// file remains. Returns the path of the new backup.
    pub fn create_backup(
        &self,
        storage: &Storage,
        passphrase: Option<&str>,
    ) -> CheckdeskResult<PathBuf> {
        let started_at = Instant::now();
        fs::create_dir_all(&self.backup_dir).map_err(|e| {
            CheckdeskError::Io(format!("Failed to create backup directory: {}", e))
        })?;

        let now = Utc::now();
        let stem = format!(
            "{}{}-{:03}",
            BACKUP_PREFIX,
            now.format("%Y%m%d-%H%M%S"),
            now.timestamp_subsec_millis()
        );
        let snapshot_path = self.backup_dir.join(format!("{}{}", stem, PLAIN_SUFFIX));
        if snapshot_path.exists() {
            return Err(CheckdeskError::Storage(format!(
                "Backup {} already exists",
                snapshot_path.display()
            )));
        }

        storage
            .conn()
            .execute(
                "VACUUM INTO ?1",
                [snapshot_path.to_string_lossy().as_ref()],
            )
            .map_err(|e| CheckdeskError::Storage(format!("Failed to snapshot database: {}", e)))?;

        let backup_path = match passphrase {
            None => snapshot_path,
            Some(passphrase) => {
                let sealed = self.seal(&snapshot_path, passphrase);
                // The plaintext snapshot must not outlive this call
                let removed = fs::remove_file(&snapshot_path);
                let sealed = sealed?;
                removed.map_err(|e| {
                    CheckdeskError::Io(format!("Failed to remove plaintext snapshot: {}", e))
                })?;
                sealed
            }
        };

        info!(
            "event=backup_create status=ok file={} encrypted={} duration_ms={}",
            backup_path.display(),
            passphrase.is_some(),
            started_at.elapsed().as_millis()
        );
        Ok(backup_path)
    }

    fn seal(&self, snapshot_path: &Path, passphrase: &str) -> CheckdeskResult<PathBuf> {
        let plaintext = fs::read(snapshot_path)
            .map_err(|e| CheckdeskError::Io(format!("Failed to read snapshot: {}", e)))?;
        let kdf = self.kdf.clone().unwrap_or_default();
        let encrypted = encrypt_with_params(&plaintext, passphrase, kdf)?;

        let file_name = snapshot_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let stem = file_name.trim_end_matches(PLAIN_SUFFIX);
        let sealed_path = self.backup_dir.join(format!("{}{}", stem, ENCRYPTED_SUFFIX));

        let json = serde_json::to_vec(&encrypted)?;
        fs::write(&sealed_path, json)
            .map_err(|e| CheckdeskError::Io(format!("Failed to write encrypted backup: {}", e)))?;
        Ok(sealed_path)
    }

    /// All backups, newest first
    pub fn list_backups(&self) -> CheckdeskResult<Vec<BackupInfo>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for entry in fs::read_dir(&self.backup_dir).map_err(|e| {
            CheckdeskError::Io(format!("Failed to read backup directory: {}", e))
        })? {
            let entry = entry
                .map_err(|e| CheckdeskError::Io(format!("Failed to read directory entry: {}", e)))?;
            if let Some(info) = parse_backup_info(&entry.path()) {
                backups.push(info);
            }
        }

        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        mark_monthly(&mut backups);
        Ok(backups)
    }

    /// Delete backups beyond the daily and monthly quotas
    pub fn enforce_retention(&self) -> CheckdeskResult<Vec<PathBuf>> {
        let backups = self.list_backups()?;
        let mut deleted = Vec::new();

        let (monthly, daily): (Vec<_>, Vec<_>) = backups.into_iter().partition(|b| b.is_monthly);

        let expired = daily
            .into_iter()
            .skip(self.retention.daily_count as usize)
            .chain(monthly.into_iter().skip(self.retention.monthly_count as usize));
        for backup in expired {
            fs::remove_file(&backup.path)
                .map_err(|e| CheckdeskError::Io(format!("Failed to delete old backup: {}", e)))?;
            deleted.push(backup.path);
        }

        if !deleted.is_empty() {
            info!("event=backup_retention status=ok deleted={}", deleted.len());
        }
        Ok(deleted)
    }

    /// Create a backup and then enforce the retention policy
    pub fn create_backup_with_retention(
        &self,
        storage: &Storage,
        passphrase: Option<&str>,
    ) -> CheckdeskResult<(PathBuf, Vec<PathBuf>)> {
        let backup_path = self.create_backup(storage, passphrase)?;
        let deleted = self.enforce_retention()?;
        Ok((backup_path, deleted))
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Look a backup up by file name
    pub fn get_backup(&self, filename: &str) -> CheckdeskResult<Option<BackupInfo>> {
        Ok(self
            .list_backups()?
            .into_iter()
            .find(|backup| backup.filename == filename))
    }

    pub fn get_latest_backup(&self) -> CheckdeskResult<Option<BackupInfo>> {
        Ok(self.list_backups()?.into_iter().next())
    }
}

/// Whether `path` names an encrypted backup
pub(crate) fn is_encrypted_path(path: &Path) -> bool {
    path.to_string_lossy().ends_with(ENCRYPTED_SUFFIX)
}

fn parse_backup_info(path: &Path) -> Option<BackupInfo> {
    let filename = path.file_name()?.to_string_lossy().to_string();
    let rest = filename.strip_prefix(BACKUP_PREFIX)?;

    let (date_part, encrypted) = if let Some(stem) = rest.strip_suffix(ENCRYPTED_SUFFIX) {
        (stem, true)
    } else {
        (rest.strip_suffix(PLAIN_SUFFIX)?, false)
    };
    let created_at = parse_backup_timestamp(date_part)?;
    let size_bytes = fs::metadata(path).ok()?.len();

    Some(BackupInfo {
        filename,
        path: path.to_path_buf(),
        created_at,
        size_bytes,
        encrypted,
        is_monthly: false,
    })
}

/// Flag the oldest backup of each month; expects newest-first order
fn mark_monthly(backups: &mut [BackupInfo]) {
    let mut seen = HashSet::new();
    for backup in backups.iter_mut().rev() {
        let month = (backup.created_at.year(), backup.created_at.month());
        backup.is_monthly = seen.insert(month);
    }
}

/// Parse `YYYYMMDD-HHMMSS` with an optional `-mmm` millisecond suffix
pub(crate) fn parse_backup_timestamp(date_str: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = date_str.split('-').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return None;
    }

    let (date_part, time_part) = (parts[0], parts[1]);
    let millis: u32 = match parts.get(2) {
        Some(ms) => ms.parse().ok()?,
        None => 0,
    };
    if date_part.len() != 8 || time_part.len() != 6 {
        return None;
    }

    let date = NaiveDate::from_ymd_opt(
        date_part[0..4].parse().ok()?,
        date_part[4..6].parse().ok()?,
        date_part[6..8].parse().ok()?,
    )?;
    let time = chrono::NaiveTime::from_hms_milli_opt(
        time_part[0..2].parse().ok()?,
        time_part[2..4].parse().ok()?,
        time_part[4..6].parse().ok()?,
        millis,
    )?;

    Some(DateTime::from_naive_utc_and_offset(
        chrono::NaiveDateTime::new(date, time),
        Utc,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_env() -> (BackupManager, Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let paths = CheckdeskPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths.clone()).unwrap();

        let retention = BackupRetention {
            daily_count: 3,
            monthly_count: 2,
        };
        let manager = BackupManager::new(paths, retention).with_kdf(KeyDerivationParams::fast());
        (manager, storage, temp_dir)
    }

    fn pause() {
        std::thread::sleep(std::time::Duration::from_millis(20));
    }

    fn info_at(stamp: &str) -> BackupInfo {
        BackupInfo {
            filename: format!("backup-{}.db", stamp),
            path: PathBuf::from(format!("backup-{}.db", stamp)),
            created_at: parse_backup_timestamp(stamp).unwrap(),
            size_bytes: 0,
            encrypted: false,
            is_monthly: false,
        }
    }

    #[test]
    fn test_create_plain_backup() {
        let (manager, storage, _temp) = create_test_env();

        let path = manager.create_backup(&storage, None).unwrap();
        assert!(path.exists());
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("backup-"));
        assert!(name.ends_with(".db"));

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"SQLite format 3"));
    }

    #[test]
    fn test_create_encrypted_backup() {
        let (manager, storage, _temp) = create_test_env();

        let path = manager.create_backup(&storage, Some("correct horse")).unwrap();
        assert!(is_encrypted_path(&path));

        let backups = manager.list_backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert!(backups[0].encrypted);
    }

    #[test]
    fn test_list_backups_newest_first() {
        let (manager, storage, _temp) = create_test_env();
        assert!(manager.list_backups().unwrap().is_empty());

        manager.create_backup(&storage, None).unwrap();
        pause();
        let newest = manager.create_backup(&storage, None).unwrap();

        let backups = manager.list_backups().unwrap();
        assert_eq!(backups.len(), 2);
        assert!(backups[0].created_at >= backups[1].created_at);
        assert_eq!(manager.get_latest_backup().unwrap().unwrap().path, newest);
    }

    #[test]
    fn test_unrelated_files_are_ignored() {
        let (manager, _storage, _temp) = create_test_env();
        fs::write(manager.backup_dir().join("notes.txt"), "x").unwrap();
        fs::write(manager.backup_dir().join("backup-garbage.db"), "x").unwrap();
        assert!(manager.list_backups().unwrap().is_empty());
    }

    #[test]
    fn test_retention_policy() {
        let (manager, storage, _temp) = create_test_env();

        for _ in 0..5 {
            manager.create_backup(&storage, None).unwrap();
            pause();
        }

        // One monthly backup plus three daily ones survive
        let deleted = manager.enforce_retention().unwrap();
        assert_eq!(deleted.len(), 1);
        assert_eq!(manager.list_backups().unwrap().len(), 4);

        let (new_backup, deleted) = manager.create_backup_with_retention(&storage, None).unwrap();
        assert!(new_backup.exists());
        assert_eq!(deleted.len(), 1);
    }

    #[test]
    fn test_mark_monthly() {
        let mut backups = vec![
            info_at("20240302-090000"),
            info_at("20240301-090000"),
            info_at("20240215-090000"),
            info_at("20240203-090000"),
        ];
        mark_monthly(&mut backups);
        let flags: Vec<bool> = backups.iter().map(|b| b.is_monthly).collect();
        assert_eq!(flags, vec![false, true, false, true]);
    }

    #[test]
    fn test_parse_backup_timestamp() {
        let timestamp = parse_backup_timestamp("20251127-143022").unwrap();
        assert_eq!(timestamp.year(), 2025);
        assert_eq!(timestamp.month(), 11);
        assert_eq!(timestamp.day(), 27);

        let timestamp = parse_backup_timestamp("20251127-143022-456").unwrap();
        assert_eq!(timestamp.timestamp_subsec_millis(), 456);

        assert!(parse_backup_timestamp("2025-11-27").is_none());
        assert!(parse_backup_timestamp("20251327-143022").is_none());
    }

    #[test]
    fn test_get_backup_by_name() {
        let (manager, storage, _temp) = create_test_env();
        let path = manager.create_backup(&storage, None).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();

        assert!(manager.get_backup(&name).unwrap().is_some());
        assert!(manager.get_backup("backup-20200101-000000.db").unwrap().is_none());
    }
}
