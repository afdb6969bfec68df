//! User accounts, roles and permissions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::UserId;

/// Something a user may be allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    CheckCreate,
    CheckRead,
    CheckUpdate,
    CheckDelete,
    ClientCreate,
    ClientRead,
    ClientUpdate,
    ClientDelete,
    BankCreate,
    BankRead,
    BankUpdate,
    BankDelete,
    UserCreate,
    UserRead,
    UserUpdate,
    UserDelete,
    ReportGenerate,
    ReportExport,
    SystemBackup,
    SystemRestore,
    SystemConfig,
}

impl Permission {
    /// Dotted name shown in error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckCreate => "check.create",
            Self::CheckRead => "check.read",
            Self::CheckUpdate => "check.update",
            Self::CheckDelete => "check.delete",
            Self::ClientCreate => "client.create",
            Self::ClientRead => "client.read",
            Self::ClientUpdate => "client.update",
            Self::ClientDelete => "client.delete",
            Self::BankCreate => "bank.create",
            Self::BankRead => "bank.read",
            Self::BankUpdate => "bank.update",
            Self::BankDelete => "bank.delete",
            Self::UserCreate => "user.create",
            Self::UserRead => "user.read",
            Self::UserUpdate => "user.update",
            Self::UserDelete => "user.delete",
            Self::ReportGenerate => "report.generate",
            Self::ReportExport => "report.export",
            Self::SystemBackup => "system.backup",
            Self::SystemRestore => "system.restore",
            Self::SystemConfig => "system.config",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Accountant,
    Agent,
    #[default]
    ReadOnly,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" | "administrator" => Some(Self::Admin),
            "accountant" | "comptable" => Some(Self::Accountant),
            "agent" => Some(Self::Agent),
            "readonly" | "read-only" | "read_only" | "viewer" => Some(Self::ReadOnly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Accountant => "accountant",
            Self::Agent => "agent",
            Self::ReadOnly => "readonly",
        }
    }

    /// Whether this role grants `permission`
    pub fn allows(&self, permission: Permission) -> bool {
        use Permission::*;
        match self {
            Self::Admin => true,
            Self::Accountant => matches!(
                permission,
                CheckCreate
                    | CheckRead
                    | CheckUpdate
                    | ClientCreate
                    | ClientRead
                    | ClientUpdate
                    | BankRead
                    | ReportGenerate
                    | ReportExport
                    | SystemBackup
            ),
            Self::Agent => matches!(
                permission,
                CheckCreate | CheckRead | CheckUpdate | ClientRead | ClientUpdate | BankRead
                    | ReportGenerate
            ),
            Self::ReadOnly => matches!(
                permission,
                CheckRead | ClientRead | BankRead | ReportGenerate
            ),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An application user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,

    /// Argon2id PHC string; never serialized to exports
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub role: Role,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    pub active: bool,

    /// Consecutive failed logins since the last success
    #[serde(default)]
    pub failed_logins: u32,

    #[serde(default)]
    pub locked_until: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(username: impl Into<String>, password_hash: String, role: Role) -> Self {
        Self {
            id: UserId::new(),
            username: username.into().trim().to_lowercase(),
            password_hash,
            role,
            full_name: String::new(),
            email: String::new(),
            active: true,
            failed_logins: 0,
            locked_until: None,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.active && self.role.allows(permission)
    }

    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.map(|until| until > now).unwrap_or(false)
    }

    pub fn validate(&self) -> Result<(), UserValidationError> {
        let name = &self.username;
        if name.len() < 3 || name.len() > 32 {
            return Err(UserValidationError::UsernameLength(name.len()));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        {
            return Err(UserValidationError::UsernameCharacters(name.clone()));
        }
        if !self.email.is_empty() && !super::client::looks_like_email(&self.email) {
            return Err(UserValidationError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.username, self.role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    UsernameLength(usize),
    UsernameCharacters(String),
    InvalidEmail(String),
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UsernameLength(len) => {
                write!(f, "Username must be 3 to 32 characters (got {})", len)
            }
            Self::UsernameCharacters(name) => write!(
                f,
                "Username '{}' may only contain letters, digits, '_', '.' and '-'",
                name
            ),
            Self::InvalidEmail(e) => write!(f, "Invalid user email: {}", e),
        }
    }
}

impl std::error::Error for UserValidationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_admin_can_do_everything() {
        for permission in [
            Permission::CheckDelete,
            Permission::UserCreate,
            Permission::SystemRestore,
            Permission::SystemConfig,
        ] {
            assert!(Role::Admin.allows(permission));
        }
    }

    #[test]
    fn test_accountant_permissions() {
        let role = Role::Accountant;
        assert!(role.allows(Permission::CheckCreate));
        assert!(role.allows(Permission::ReportExport));
        assert!(role.allows(Permission::SystemBackup));
        assert!(!role.allows(Permission::CheckDelete));
        assert!(!role.allows(Permission::BankCreate));
        assert!(!role.allows(Permission::UserCreate));
    }

    #[test]
    fn test_agent_and_readonly_permissions() {
        assert!(Role::Agent.allows(Permission::CheckUpdate));
        assert!(!Role::Agent.allows(Permission::ClientCreate));
        assert!(!Role::Agent.allows(Permission::ReportExport));

        assert!(Role::ReadOnly.allows(Permission::CheckRead));
        assert!(Role::ReadOnly.allows(Permission::ReportGenerate));
        assert!(!Role::ReadOnly.allows(Permission::CheckCreate));
    }

    #[test]
    fn test_inactive_user_has_no_permissions() {
        let mut user = User::new("admin", String::new(), Role::Admin);
        assert!(user.can(Permission::CheckRead));
        user.active = false;
        assert!(!user.can(Permission::CheckRead));
    }

    #[test]
    fn test_lock_window() {
        let now = Utc::now();
        let mut user = User::new("agent1", String::new(), Role::Agent);
        assert!(!user.is_locked(now));
        user.locked_until = Some(now + Duration::minutes(15));
        assert!(user.is_locked(now));
        assert!(!user.is_locked(now + Duration::minutes(16)));
    }

    #[test]
    fn test_username_validation() {
        assert!(User::new("Fatima.Z", String::new(), Role::Agent).validate().is_ok());
        assert!(matches!(
            User::new("ab", String::new(), Role::Agent).validate(),
            Err(UserValidationError::UsernameLength(2))
        ));
        assert!(matches!(
            User::new("bad name", String::new(), Role::Agent).validate(),
            Err(UserValidationError::UsernameCharacters(_))
        ));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("comptable"), Some(Role::Accountant));
        assert_eq!(Role::parse("read-only"), Some(Role::ReadOnly));
        assert_eq!(Role::parse("root"), None);
    }
}
