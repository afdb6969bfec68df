//! Path management for checkdesk
//!
//! Provides platform-aware path resolution for configuration, the database,
//! backups, exports and logs.
//!
//! ## Path Resolution Order
//!
//! 1. `CHECKDESK_DATA_DIR` environment variable (if set)
//! 2. The platform config directory from the `directories` crate
//!    (`~/.config/checkdesk` on Linux, `%APPDATA%\checkdesk` on Windows)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::CheckdeskError;

/// Environment variable that overrides the base directory
pub const DATA_DIR_ENV: &str = "CHECKDESK_DATA_DIR";

/// Manages all paths used by checkdesk
#[derive(Debug, Clone)]
pub struct CheckdeskPaths {
    /// Base directory for all checkdesk data
    base_dir: PathBuf,
}

impl CheckdeskPaths {
    /// Create a new CheckdeskPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no home/config directory can be determined.
    pub fn new() -> Result<Self, CheckdeskError> {
        let base_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(custom) if !custom.trim().is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create CheckdeskPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (holds the SQLite database)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the backup directory
    pub fn backup_dir(&self) -> PathBuf {
        self.base_dir.join("backups")
    }

    /// Get the default export directory
    pub fn export_dir(&self) -> PathBuf {
        self.base_dir.join("exports")
    }

    /// Get the log directory
    pub fn log_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the SQLite database
    pub fn database_file(&self) -> PathBuf {
        self.data_dir().join("checkdesk.db")
    }

    /// Get the path to the audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Get the path to the login session file
    pub fn session_file(&self) -> PathBuf {
        self.base_dir.join("session.json")
    }

    /// Get the path to the saved searches file
    pub fn saved_searches_file(&self) -> PathBuf {
        self.base_dir.join("saved_searches.json")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), CheckdeskError> {
        for (label, dir) in [
            ("base", self.base_dir.clone()),
            ("data", self.data_dir()),
            ("backup", self.backup_dir()),
            ("export", self.export_dir()),
            ("log", self.log_dir()),
        ] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                CheckdeskError::Io(format!("Failed to create {} directory: {}", label, e))
            })?;
        }

        Ok(())
    }

    /// Check if checkdesk has been initialized (database exists)
    pub fn is_initialized(&self) -> bool {
        self.database_file().exists()
    }
}

fn resolve_default_path() -> Result<PathBuf, CheckdeskError> {
    ProjectDirs::from("", "", "checkdesk")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| CheckdeskError::Config("Could not determine home directory".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_custom_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = CheckdeskPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.base_dir(), temp_dir.path());
        assert_eq!(paths.data_dir(), temp_dir.path().join("data"));
        assert_eq!(paths.backup_dir(), temp_dir.path().join("backups"));
        assert_eq!(
            paths.database_file(),
            temp_dir.path().join("data").join("checkdesk.db")
        );
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = CheckdeskPaths::with_base_dir(temp_dir.path().to_path_buf());

        paths.ensure_directories().unwrap();

        assert!(paths.data_dir().exists());
        assert!(paths.backup_dir().exists());
        assert!(paths.export_dir().exists());
        assert!(paths.log_dir().exists());
        assert!(!paths.is_initialized());
    }
}
