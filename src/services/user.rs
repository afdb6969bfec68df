//! User service
//!
//! Account creation under the password policy, authentication with lockout
//! after repeated failures, and role management. The last active admin can
//! neither be demoted nor deactivated.

use chrono::{DateTime, Duration, Utc};
use log::{info, warn};

use crate::audit::EntityType;
use crate::config::settings::SecuritySettings;
use crate::crypto::{hash_password, verify_password};
use crate::error::{CheckdeskError, CheckdeskResult};
use crate::models::{Permission, Role, User, UserId};
use crate::storage::Storage;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Fail unless `user` holds `permission`
pub fn require_permission(user: &User, permission: Permission) -> CheckdeskResult<()> {
    if user.can(permission) {
        Ok(())
    } else {
        Err(CheckdeskError::PermissionDenied {
            role: user.role.to_string(),
            permission: permission.to_string(),
        })
    }
}

/// Optional profile fields for a new user
#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    pub full_name: String,
    pub email: String,
}

/// Service for user management
pub struct UserService<'a> {
    storage: &'a Storage,
    security: &'a SecuritySettings,
}

impl<'a> UserService<'a> {
    pub fn new(storage: &'a Storage, security: &'a SecuritySettings) -> Self {
        Self { storage, security }
    }

    /// Create a user after checking the password policy
    pub fn create(
        &self,
        username: &str,
        password: &str,
        role: Role,
        profile: UserProfile,
    ) -> CheckdeskResult<User> {
        self.check_policy(password)?;

        let mut user = User::new(username, hash_password(password)?, role);
        user.full_name = profile.full_name.trim().to_string();
        user.email = profile.email.trim().to_string();

        self.storage.users().insert(&user)?;
        self.storage.log_create(
            EntityType::User,
            user.id.to_string(),
            Some(user.username.clone()),
            &user,
        )?;
        info!(
            "event=user_create status=ok username={} role={}",
            user.username, user.role
        );

        Ok(user)
    }

    /// Create the first administrator; refused once any user exists
    pub fn bootstrap_admin(&self, username: &str, password: &str) -> CheckdeskResult<User> {
        if self.storage.users().count()? > 0 {
            return Err(CheckdeskError::Validation(
                "Users already exist; log in as an admin to add more".into(),
            ));
        }
        self.create(
            username,
            password,
            Role::Admin,
            UserProfile {
                full_name: "Administrator".into(),
                email: String::new(),
            },
        )
    }

    /// Verify credentials at `now`, applying the lockout policy
    pub fn authenticate(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> CheckdeskResult<User> {
        let username = username.trim().to_lowercase();
        let mut user = match self.storage.users().get_by_username(&username)? {
            Some(user) => user,
            None => {
                warn!("event=login status=error reason=unknown_user");
                return Err(CheckdeskError::Authentication(INVALID_CREDENTIALS.into()));
            }
        };

        if !user.active {
            warn!("event=login status=error reason=inactive username={}", username);
            return Err(CheckdeskError::Authentication("Account is disabled".into()));
        }
        if user.is_locked(now) {
            let until = user
                .locked_until
                .map(|t| t.format("%H:%M UTC").to_string())
                .unwrap_or_default();
            warn!("event=login status=error reason=locked username={}", username);
            return Err(CheckdeskError::Authentication(format!(
                "Account locked until {}",
                until
            )));
        }

        if !verify_password(password, &user.password_hash)? {
            user.failed_logins += 1;
            let locked = user.failed_logins >= self.security.max_login_attempts;
            if locked {
                user.locked_until = Some(now + Duration::minutes(self.security.lockout_minutes));
                user.failed_logins = 0;
            }
            self.storage.users().update(&user)?;
            warn!(
                "event=login status=error reason=bad_password username={} locked={}",
                username, locked
            );
            return Err(CheckdeskError::Authentication(if locked {
                format!(
                    "Too many failed attempts; account locked for {} minutes",
                    self.security.lockout_minutes
                )
            } else {
                INVALID_CREDENTIALS.to_string()
            }));
        }

        user.failed_logins = 0;
        user.locked_until = None;
        user.last_login = Some(now);
        self.storage.users().update(&user)?;
        info!("event=login status=ok username={}", username);

        Ok(user)
    }

    /// Change a password; `current` is required unless an admin resets it
    pub fn change_password(
        &self,
        id: UserId,
        current: Option<&str>,
        new_password: &str,
    ) -> CheckdeskResult<()> {
        let mut user = self.get_required(id)?;
        if let Some(current) = current {
            if !verify_password(current, &user.password_hash)? {
                return Err(CheckdeskError::Authentication(
                    "Current password is incorrect".into(),
                ));
            }
        }
        self.check_policy(new_password)?;

        user.password_hash = hash_password(new_password)?;
        user.failed_logins = 0;
        user.locked_until = None;
        self.storage.users().update(&user)?;
        info!("event=password_change status=ok username={}", user.username);
        Ok(())
    }

    pub fn set_role(&self, id: UserId, role: Role) -> CheckdeskResult<User> {
        let mut user = self.get_required(id)?;
        if user.role == role {
            return Ok(user);
        }
        if user.role == Role::Admin && user.active {
            self.ensure_other_admin(&user)?;
        }

        let before = user.clone();
        user.role = role;
        self.storage.users().update(&user)?;
        self.storage.log_update(
            EntityType::User,
            user.id.to_string(),
            Some(user.username.clone()),
            &before,
            &user,
        )?;
        Ok(user)
    }

    pub fn deactivate(&self, id: UserId) -> CheckdeskResult<User> {
        let user = self.get_required(id)?;
        if !user.active {
            return Ok(user);
        }
        if user.role == Role::Admin {
            self.ensure_other_admin(&user)?;
        }
        self.set_active(user, false)
    }

    pub fn reactivate(&self, id: UserId) -> CheckdeskResult<User> {
        let user = self.get_required(id)?;
        self.set_active(user, true)
    }

    fn set_active(&self, mut user: User, active: bool) -> CheckdeskResult<User> {
        let before = user.clone();
        user.active = active;
        self.storage.users().update(&user)?;
        self.storage.log_update(
            EntityType::User,
            user.id.to_string(),
            Some(user.username.clone()),
            &before,
            &user,
        )?;
        Ok(user)
    }

    /// Clear a lockout before it expires
    pub fn unlock(&self, id: UserId) -> CheckdeskResult<User> {
        let mut user = self.get_required(id)?;
        user.failed_logins = 0;
        user.locked_until = None;
        self.storage.users().update(&user)?;
        Ok(user)
    }

    pub fn get(&self, id: UserId) -> CheckdeskResult<Option<User>> {
        self.storage.users().get(id)
    }

    fn get_required(&self, id: UserId) -> CheckdeskResult<User> {
        self.storage
            .users()
            .get(id)?
            .ok_or_else(|| CheckdeskError::user_not_found(id.to_string()))
    }

    pub fn list(&self, include_inactive: bool) -> CheckdeskResult<Vec<User>> {
        self.storage.users().list(include_inactive)
    }

    /// Find a user by username or id
    pub fn find(&self, identifier: &str) -> CheckdeskResult<Option<User>> {
        let username = identifier.trim().to_lowercase();
        if let Some(user) = self.storage.users().get_by_username(&username)? {
            return Ok(Some(user));
        }
        match self.storage.users().resolve(identifier)? {
            Some(id) => self.storage.users().get(id),
            None => Ok(None),
        }
    }

    pub fn find_required(&self, identifier: &str) -> CheckdeskResult<User> {
        self.find(identifier)?
            .ok_or_else(|| CheckdeskError::user_not_found(identifier))
    }

    fn check_policy(&self, password: &str) -> CheckdeskResult<()> {
        let violations = self.security.password_policy.violations(password);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(CheckdeskError::Validation(format!(
                "Password {}",
                violations.join("; ")
            )))
        }
    }

    fn ensure_other_admin(&self, user: &User) -> CheckdeskResult<()> {
        if self.storage.users().count_active_with_role(Role::Admin)? <= 1 {
            return Err(CheckdeskError::Validation(format!(
                "'{}' is the last active admin",
                user.username
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = "Str0ng!pass";

    fn security() -> SecuritySettings {
        SecuritySettings::default()
    }

    #[test]
    fn test_create_applies_policy() {
        let storage = Storage::open_in_memory().unwrap();
        let security = security();
        let service = UserService::new(&storage, &security);

        let err = service
            .create("clerk", "weak", Role::Agent, UserProfile::default())
            .unwrap_err();
        assert!(err.is_validation());

        let user = service
            .create("Clerk", GOOD, Role::Agent, UserProfile::default())
            .unwrap();
        assert_eq!(user.username, "clerk");
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_authenticate() {
        let storage = Storage::open_in_memory().unwrap();
        let security = security();
        let service = UserService::new(&storage, &security);
        service.bootstrap_admin("admin", GOOD).unwrap();

        let now = Utc::now();
        let user = service.authenticate("ADMIN", GOOD, now).unwrap();
        assert_eq!(user.last_login, Some(now));

        let err = service.authenticate("admin", "nope", now).unwrap_err();
        assert!(matches!(err, CheckdeskError::Authentication(_)));
        assert!(service.authenticate("ghost", GOOD, now).is_err());
    }

    #[test]
    fn test_lockout_after_max_attempts() {
        let storage = Storage::open_in_memory().unwrap();
        let security = SecuritySettings {
            max_login_attempts: 3,
            lockout_minutes: 15,
            ..SecuritySettings::default()
        };
        let service = UserService::new(&storage, &security);
        service
            .create("agent", GOOD, Role::Agent, UserProfile::default())
            .unwrap();

        let now = Utc::now();
        for _ in 0..3 {
            assert!(service.authenticate("agent", "bad", now).is_err());
        }

        // Correct password is refused while locked
        let err = service.authenticate("agent", GOOD, now).unwrap_err();
        assert!(err.to_string().contains("locked"));

        let later = now + Duration::minutes(16);
        assert!(service.authenticate("agent", GOOD, later).is_ok());
    }

    #[test]
    fn test_bootstrap_only_once() {
        let storage = Storage::open_in_memory().unwrap();
        let security = security();
        let service = UserService::new(&storage, &security);
        service.bootstrap_admin("admin", GOOD).unwrap();
        assert!(service.bootstrap_admin("admin2", GOOD).is_err());
    }

    #[test]
    fn test_last_admin_protected() {
        let storage = Storage::open_in_memory().unwrap();
        let security = security();
        let service = UserService::new(&storage, &security);
        let admin = service.bootstrap_admin("admin", GOOD).unwrap();

        assert!(service.set_role(admin.id, Role::Agent).is_err());
        assert!(service.deactivate(admin.id).is_err());

        let second = service
            .create("boss", GOOD, Role::Admin, UserProfile::default())
            .unwrap();
        service.set_role(admin.id, Role::Accountant).unwrap();
        assert!(service.deactivate(second.id).is_err());
    }

    #[test]
    fn test_change_password() {
        let storage = Storage::open_in_memory().unwrap();
        let security = security();
        let service = UserService::new(&storage, &security);
        let user = service
            .create("acct", GOOD, Role::Accountant, UserProfile::default())
            .unwrap();

        assert!(service
            .change_password(user.id, Some("wrong"), "N3w!password")
            .is_err());
        service
            .change_password(user.id, Some(GOOD), "N3w!password")
            .unwrap();
        assert!(service
            .authenticate("acct", "N3w!password", Utc::now())
            .is_ok());
    }

    #[test]
    fn test_require_permission() {
        let readonly = User::new("viewer", String::new(), Role::ReadOnly);
        assert!(require_permission(&readonly, Permission::CheckRead).is_ok());
        assert!(require_permission(&readonly, Permission::CheckCreate)
            .unwrap_err()
            .is_permission_denied());

        let mut admin = User::new("root", String::new(), Role::Admin);
        assert!(require_permission(&admin, Permission::SystemRestore).is_ok());
        admin.active = false;
        assert!(require_permission(&admin, Permission::CheckRead).is_err());
    }
}
