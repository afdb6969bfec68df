//! Notification repository

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::CheckdeskResult;
use crate::models::{CheckId, Notification, NotificationId, NotificationKind, UserId};

use super::{bool_to_int, parse_column, resolve_id_prefix};

const NOTIFICATION_SELECT_SQL: &str = "SELECT
    id, kind, title, message, check_id, user_id, read, for_date, created_at
FROM notifications";

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        kind: parse_column(row, 1, NotificationKind::parse)?,
        title: row.get(2)?,
        message: row.get(3)?,
        check_id: row.get(4)?,
        user_id: row.get(5)?,
        read: row.get(6)?,
        for_date: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// SQLite-backed notification repository
pub struct NotificationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> NotificationRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, notification: &Notification) -> CheckdeskResult<()> {
        self.conn.execute(
            "INSERT INTO notifications (
                id, kind, title, message, check_id, user_id, read, for_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                notification.id,
                notification.kind.as_str(),
                notification.title,
                notification.message,
                notification.check_id,
                notification.user_id,
                bool_to_int(notification.read),
                notification.for_date,
                notification.created_at,
            ],
        )?;
        Ok(())
    }

    /// Whether a reminder of `kind` already exists for the check on `day`
    pub fn exists_for_day(
        &self,
        kind: NotificationKind,
        check_id: CheckId,
        day: NaiveDate,
    ) -> CheckdeskResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM notifications WHERE kind = ?1 AND check_id = ?2 AND for_date = ?3
            )",
            params![kind.as_str(), check_id, day],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    pub fn get(&self, id: NotificationId) -> CheckdeskResult<Option<Notification>> {
        let notification = self
            .conn
            .query_row(
                &format!("{NOTIFICATION_SELECT_SQL} WHERE id = ?1"),
                [id],
                notification_from_row,
            )
            .optional()?;
        Ok(notification)
    }

    /// Newest first; a user sees their own and broadcast notifications
    pub fn list(
        &self,
        user_id: Option<UserId>,
        unread_only: bool,
        limit: usize,
    ) -> CheckdeskResult<Vec<Notification>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTIFICATION_SELECT_SQL}
             WHERE (?1 IS NULL OR user_id = ?1 OR user_id IS NULL)
               AND (?2 = 0 OR read = 0)
             ORDER BY created_at DESC
             LIMIT ?3"
        ))?;
        let notifications = stmt
            .query_map(
                params![user_id, bool_to_int(unread_only), limit as i64],
                notification_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notifications)
    }

    pub fn count_unread(&self, user_id: Option<UserId>) -> CheckdeskResult<u64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM notifications
             WHERE read = 0 AND (?1 IS NULL OR user_id = ?1 OR user_id IS NULL)",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn mark_read(&self, id: NotificationId) -> CheckdeskResult<bool> {
        let changed = self
            .conn
            .execute("UPDATE notifications SET read = 1 WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    /// Mark everything visible to the user as read; returns how many changed
    pub fn mark_all_read(&self, user_id: Option<UserId>) -> CheckdeskResult<usize> {
        let changed = self.conn.execute(
            "UPDATE notifications SET read = 1
             WHERE read = 0 AND (?1 IS NULL OR user_id = ?1 OR user_id IS NULL)",
            [user_id],
        )?;
        Ok(changed)
    }

    pub fn delete(&self, id: NotificationId) -> CheckdeskResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM notifications WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    /// Remove notifications; `read_only` keeps the unread ones
    pub fn clear(&self, read_only: bool) -> CheckdeskResult<usize> {
        let changed = self.conn.execute(
            "DELETE FROM notifications WHERE (?1 = 0 OR read = 1)",
            [bool_to_int(read_only)],
        )?;
        Ok(changed)
    }

    pub fn resolve(&self, input: &str) -> CheckdeskResult<Option<NotificationId>> {
        resolve_id_prefix(
            self.conn,
            "notifications",
            NotificationId::strip_display_prefix(input),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, User};
    use crate::storage::Storage;

    fn note(title: &str) -> Notification {
        Notification::new(NotificationKind::StatusChange, title, "message", None)
    }

    #[test]
    fn test_list_scoping_and_unread() {
        let storage = Storage::open_in_memory().unwrap();
        let alice = User::new("alice", String::new(), Role::Agent);
        let bob = User::new("bob", String::new(), Role::Agent);
        storage.users().insert(&alice).unwrap();
        storage.users().insert(&bob).unwrap();

        let repo = storage.notifications();
        repo.insert(&note("broadcast")).unwrap();
        repo.insert(&note("for alice").for_user(Some(alice.id))).unwrap();
        repo.insert(&note("for bob").for_user(Some(bob.id))).unwrap();

        assert_eq!(repo.list(None, false, 50).unwrap().len(), 3);
        assert_eq!(repo.list(Some(alice.id), false, 50).unwrap().len(), 2);
        assert_eq!(repo.count_unread(Some(bob.id)).unwrap(), 2);

        assert_eq!(repo.mark_all_read(Some(alice.id)).unwrap(), 2);
        assert_eq!(repo.count_unread(Some(bob.id)).unwrap(), 1);
        assert!(repo.list(Some(alice.id), true, 50).unwrap().is_empty());
    }

    #[test]
    fn test_mark_read_delete_clear() {
        let storage = Storage::open_in_memory().unwrap();
        let repo = storage.notifications();
        let a = note("a");
        let b = note("b");
        repo.insert(&a).unwrap();
        repo.insert(&b).unwrap();

        assert!(repo.mark_read(a.id).unwrap());
        assert!(repo.get(a.id).unwrap().unwrap().read);

        assert_eq!(repo.clear(true).unwrap(), 1);
        assert!(repo.get(b.id).unwrap().is_some());

        assert!(repo.delete(b.id).unwrap());
        assert_eq!(repo.clear(false).unwrap(), 0);
    }

    #[test]
    fn test_list_limit() {
        let storage = Storage::open_in_memory().unwrap();
        for i in 0..5 {
            storage.notifications().insert(&note(&i.to_string())).unwrap();
        }
        assert_eq!(storage.notifications().list(None, false, 3).unwrap().len(), 3);
    }
}
