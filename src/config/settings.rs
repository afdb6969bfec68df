//! User settings for checkdesk
//!
//! Manages application preferences: company name, currency, notification
//! window, export defaults, password policy and backup retention.

use serde::{Deserialize, Serialize};

use super::paths::CheckdeskPaths;
use crate::error::CheckdeskError;

/// Default export format preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormatPreference {
    Csv,
    #[default]
    Xlsx,
    Pdf,
}

/// Backup retention settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRetention {
    /// Number of daily backups to keep
    pub daily_count: u32,
    /// Number of monthly backups to keep
    pub monthly_count: u32,
}

impl Default for BackupRetention {
    fn default() -> Self {
        Self {
            daily_count: 30,
            monthly_count: 12,
        }
    }
}

/// Rules every new password must satisfy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: true,
        }
    }
}

/// Characters accepted as "special" by the password policy
pub const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

impl PasswordPolicy {
    /// Check a password against the policy, returning every violated rule
    pub fn violations(&self, password: &str) -> Vec<String> {
        let mut errors = Vec::new();

        if password.chars().count() < self.min_length {
            errors.push(format!(
                "must be at least {} characters long",
                self.min_length
            ));
        }
        if self.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
            errors.push("must contain an uppercase letter".to_string());
        }
        if self.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
            errors.push("must contain a lowercase letter".to_string());
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            errors.push("must contain a digit".to_string());
        }
        if self.require_special && !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
            errors.push("must contain a special character".to_string());
        }

        errors
    }
}

/// Login lockout and session lifetime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecuritySettings {
    /// Failed logins before the account is locked
    pub max_login_attempts: u32,
    /// Lockout duration after too many failures
    pub lockout_minutes: i64,
    /// How long a login session stays valid
    pub session_hours: i64,
    #[serde(default)]
    pub password_policy: PasswordPolicy,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            max_login_attempts: 5,
            lockout_minutes: 15,
            session_hours: 8,
            password_policy: PasswordPolicy::default(),
        }
    }
}

/// User settings for checkdesk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Company name printed on reports
    #[serde(default = "default_company_name")]
    pub company_name: String,

    /// Currency for new checks
    #[serde(default = "default_currency")]
    pub default_currency: String,

    /// Days before the due date at which a check is "due soon"
    #[serde(default = "default_notification_days")]
    pub notification_days: u32,

    /// Date format preference (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Format used when `export` is called without `--format`
    #[serde(default)]
    pub default_export_format: ExportFormatPreference,

    /// Log level for the file logger
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Backup retention policy
    #[serde(default)]
    pub backup_retention: BackupRetention,

    /// Login and password rules
    #[serde(default)]
    pub security: SecuritySettings,
}

fn default_schema_version() -> u32 {
    1
}

fn default_company_name() -> String {
    "Your Company".to_string()
}

fn default_currency() -> String {
    "MAD".to_string()
}

fn default_notification_days() -> u32 {
    3
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            company_name: default_company_name(),
            default_currency: default_currency(),
            notification_days: default_notification_days(),
            date_format: default_date_format(),
            default_export_format: ExportFormatPreference::default(),
            log_level: default_log_level(),
            backup_retention: BackupRetention::default(),
            security: SecuritySettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &CheckdeskPaths) -> Result<Self, CheckdeskError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                CheckdeskError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                CheckdeskError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &CheckdeskPaths) -> Result<(), CheckdeskError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            CheckdeskError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(paths.settings_file(), contents).map_err(|e| {
            CheckdeskError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }

    /// Read a setting by dotted key (e.g. `security.lockout_minutes`)
    pub fn get(&self, key: &str) -> Result<Option<serde_json::Value>, CheckdeskError> {
        let root = serde_json::to_value(self)?;
        let mut value = &root;
        for part in key.split('.') {
            match value.get(part) {
                Some(next) => value = next,
                None => return Ok(None),
            }
        }
        Ok(Some(value.clone()))
    }

    /// Update a setting by dotted key
    ///
    /// The raw value is parsed as JSON when possible (numbers, booleans),
    /// otherwise it is stored as a string. The result must still deserialize
    /// into valid settings.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<(), CheckdeskError> {
        let mut root = serde_json::to_value(&*self)?;
        let new_value = serde_json::from_str(raw)
            .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));

        let parts: Vec<&str> = key.split('.').collect();
        let (last, parents) = parts
            .split_last()
            .ok_or_else(|| CheckdeskError::Config("Empty setting key".into()))?;

        let mut cursor = &mut root;
        for part in parents {
            cursor = cursor
                .get_mut(*part)
                .ok_or_else(|| CheckdeskError::Config(format!("Unknown setting: {}", key)))?;
        }

        let object = cursor
            .as_object_mut()
            .ok_or_else(|| CheckdeskError::Config(format!("Unknown setting: {}", key)))?;
        if !object.contains_key(*last) {
            return Err(CheckdeskError::Config(format!("Unknown setting: {}", key)));
        }
        object.insert(last.to_string(), new_value);

        *self = serde_json::from_value(root).map_err(|e| {
            CheckdeskError::Config(format!("Invalid value for {}: {}", key, e))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.default_currency, "MAD");
        assert_eq!(settings.notification_days, 3);
        assert_eq!(settings.backup_retention.daily_count, 30);
        assert_eq!(settings.security.max_login_attempts, 5);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = CheckdeskPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.notification_days = 7;
        settings.company_name = "Atlas Trading".into();
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.notification_days, 7);
        assert_eq!(loaded.company_name, "Atlas Trading");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = CheckdeskPaths::with_base_dir(temp_dir.path().to_path_buf());
        paths.ensure_directories().unwrap();
        std::fs::write(paths.settings_file(), r#"{"notification_days": 5}"#).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.notification_days, 5);
        assert_eq!(loaded.default_currency, "MAD");
    }

    #[test]
    fn test_get_and_set_dotted_keys() {
        let mut settings = Settings::default();

        settings.set("security.lockout_minutes", "30").unwrap();
        assert_eq!(settings.security.lockout_minutes, 30);

        settings.set("company_name", "Acme").unwrap();
        assert_eq!(
            settings.get("company_name").unwrap(),
            Some(serde_json::Value::String("Acme".into()))
        );

        assert!(settings.set("no_such_key", "1").is_err());
        assert!(settings.set("notification_days", "soon").is_err());
        assert_eq!(settings.get("security.unknown").unwrap(), None);
    }

    #[test]
    fn test_password_policy() {
        let policy = PasswordPolicy::default();
        assert!(policy.violations("Str0ng!pass").is_empty());
        assert_eq!(policy.violations("weak").len(), 4);
        assert!(policy
            .violations("NoDigits!!")
            .iter()
            .any(|e| e.contains("digit")));
    }
}
