//! Backup system for checkdesk
//!
//! - `BackupManager`: snapshots the database and applies retention
//! - `RestoreManager`: validates a backup and swaps it in as the live database
//!
//! Backups are named `backup-YYYYMMDD-HHMMSS-mmm.db`, or `.db.enc` when
//! sealed with a passphrase. By default 30 daily backups and 12 monthly
//! backups (the first of each month) are kept.

mod manager;
mod restore;

pub(crate) use manager::is_encrypted_path;
pub use manager::{BackupInfo, BackupManager};
pub use restore::{RestoreManager, RestoreResult, ValidationResult};
