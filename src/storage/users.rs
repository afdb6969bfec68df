//! User repository

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{CheckdeskError, CheckdeskResult};
use crate::models::{Role, User, UserId};

use super::{bool_to_int, map_constraint, parse_column, resolve_id_prefix};

const USER_SELECT_SQL: &str = "SELECT
    id, username, password_hash, role, full_name, email, active,
    failed_logins, locked_until, created_at, last_login
FROM users";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        role: parse_column(row, 3, Role::parse)?,
        full_name: row.get(4)?,
        email: row.get(5)?,
        active: row.get(6)?,
        failed_logins: row.get(7)?,
        locked_until: row.get(8)?,
        created_at: row.get(9)?,
        last_login: row.get(10)?,
    })
}

/// SQLite-backed user repository
pub struct UserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> UserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, user: &User) -> CheckdeskResult<()> {
        user.validate()
            .map_err(|e| CheckdeskError::Validation(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO users (
                    id, username, password_hash, role, full_name, email, active,
                    failed_logins, locked_until, created_at, last_login
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    user.id,
                    user.username,
                    user.password_hash,
                    user.role.as_str(),
                    user.full_name,
                    user.email,
                    bool_to_int(user.active),
                    user.failed_logins,
                    user.locked_until,
                    user.created_at,
                    user.last_login,
                ],
            )
            .map_err(|e| map_constraint(e, "User", &user.username))?;
        Ok(())
    }

    /// Persist every mutable field, including login bookkeeping
    pub fn update(&self, user: &User) -> CheckdeskResult<()> {
        user.validate()
            .map_err(|e| CheckdeskError::Validation(e.to_string()))?;

        let changed = self
            .conn
            .execute(
                "UPDATE users SET
                    password_hash = ?1, role = ?2, full_name = ?3, email = ?4, active = ?5,
                    failed_logins = ?6, locked_until = ?7, last_login = ?8
                 WHERE id = ?9",
                params![
                    user.password_hash,
                    user.role.as_str(),
                    user.full_name,
                    user.email,
                    bool_to_int(user.active),
                    user.failed_logins,
                    user.locked_until,
                    user.last_login,
                    user.id,
                ],
            )
            .map_err(|e| map_constraint(e, "User", &user.username))?;

        if changed == 0 {
            return Err(CheckdeskError::user_not_found(user.username.clone()));
        }
        Ok(())
    }

    pub fn get(&self, id: UserId) -> CheckdeskResult<Option<User>> {
        let user = self
            .conn
            .query_row(&format!("{USER_SELECT_SQL} WHERE id = ?1"), [id], user_from_row)
            .optional()?;
        Ok(user)
    }

    pub fn get_by_username(&self, username: &str) -> CheckdeskResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE username = ?1"),
                [username.trim()],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn list(&self, include_inactive: bool) -> CheckdeskResult<Vec<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL} WHERE (?1 = 1 OR active = 1) ORDER BY username"
        ))?;
        let users = stmt
            .query_map([bool_to_int(include_inactive)], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    pub fn resolve(&self, input: &str) -> CheckdeskResult<Option<UserId>> {
        resolve_id_prefix(self.conn, "users", UserId::strip_display_prefix(input))
    }

    /// Active users holding `role`
    pub fn count_active_with_role(&self, role: Role) -> CheckdeskResult<u64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role = ?1 AND active = 1",
            [role.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn count(&self) -> CheckdeskResult<u64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use chrono::{Duration, Utc};

    #[test]
    fn test_insert_and_lookup() {
        let storage = Storage::open_in_memory().unwrap();
        let user = User::new("Admin", "$argon2id$stub".into(), Role::Admin);
        storage.users().insert(&user).unwrap();

        let found = storage.users().get_by_username("ADMIN").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.password_hash, "$argon2id$stub");
        assert_eq!(storage.users().count_active_with_role(Role::Admin).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_username() {
        let storage = Storage::open_in_memory().unwrap();
        storage
            .users()
            .insert(&User::new("agent1", String::new(), Role::Agent))
            .unwrap();
        let err = storage
            .users()
            .insert(&User::new("AGENT1", String::new(), Role::Agent))
            .unwrap_err();
        assert!(matches!(err, CheckdeskError::Duplicate { .. }));
    }

    #[test]
    fn test_update_login_bookkeeping() {
        let storage = Storage::open_in_memory().unwrap();
        let mut user = User::new("agent1", String::new(), Role::Agent);
        storage.users().insert(&user).unwrap();

        user.failed_logins = 3;
        user.locked_until = Some(Utc::now() + Duration::minutes(15));
        storage.users().update(&user).unwrap();

        let stored = storage.users().get(user.id).unwrap().unwrap();
        assert_eq!(stored.failed_logins, 3);
        assert!(stored.locked_until.is_some());
    }
}
