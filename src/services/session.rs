//! Login sessions
//!
//! A successful login writes `session.json` with the user id and an expiry.
//! Later commands read it back; an expired session, or one whose user was
//! removed or deactivated, counts as logged out.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::config::settings::SecuritySettings;
use crate::error::{CheckdeskError, CheckdeskResult};
use crate::models::{User, UserId};
use crate::storage::Storage;

use super::user::UserService;

/// Contents of the session file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Reads and writes the login session
pub struct SessionService<'a> {
    storage: &'a Storage,
    path: PathBuf,
}

impl<'a> SessionService<'a> {
    pub fn new(storage: &'a Storage, path: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            path: path.into(),
        }
    }

    /// Authenticate and persist a session valid for `session_hours`
    pub fn login(
        &self,
        username: &str,
        password: &str,
        security: &SecuritySettings,
        now: DateTime<Utc>,
    ) -> CheckdeskResult<(User, Session)> {
        let user = UserService::new(self.storage, security).authenticate(username, password, now)?;

        let session = Session {
            user_id: user.id,
            username: user.username.clone(),
            created_at: now,
            expires_at: now + Duration::hours(security.session_hours),
        };
        let contents = serde_json::to_string_pretty(&session)?;
        std::fs::write(&self.path, contents).map_err(|e| {
            CheckdeskError::Io(format!("Failed to write session file: {}", e))
        })?;

        Ok((user, session))
    }

    /// The logged-in user, if a valid session exists at `now`
    pub fn current_user(&self, now: DateTime<Utc>) -> CheckdeskResult<Option<User>> {
        let Some(session) = self.read()? else {
            return Ok(None);
        };

        if session.is_expired(now) {
            info!("event=session_expired username={}", session.username);
            self.logout()?;
            return Ok(None);
        }

        match self.storage.users().get(session.user_id)? {
            Some(user) if user.active => Ok(Some(user)),
            _ => {
                self.logout()?;
                Ok(None)
            }
        }
    }

    /// Like [`current_user`](Self::current_user), but logged out is an error
    pub fn require_user(&self, now: DateTime<Utc>) -> CheckdeskResult<User> {
        self.current_user(now)?.ok_or_else(|| {
            CheckdeskError::Authentication("Not logged in; run `checkdesk login` first".into())
        })
    }

    /// Remove the session; returns whether one existed
    pub fn logout(&self) -> CheckdeskResult<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)
            .map_err(|e| CheckdeskError::Io(format!("Failed to remove session file: {}", e)))?;
        Ok(true)
    }

    fn read(&self) -> CheckdeskResult<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| CheckdeskError::Io(format!("Failed to read session file: {}", e)))?;
        match serde_json::from_str(&contents) {
            Ok(session) => Ok(Some(session)),
            Err(_) => {
                self.logout()?;
                Ok(None)
            }
        }
    }
}
