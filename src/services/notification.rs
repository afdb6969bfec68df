//! Notification service
//!
//! Due-date reminders and status-change alerts. Reminders are generated on
//! demand for a given day, so running the generator twice on the same day
//! never produces a second reminder for the same check.

use chrono::{Days, NaiveDate};
use log::{debug, info};

use crate::audit::EntityType;
use crate::error::{CheckdeskError, CheckdeskResult};
use crate::models::{Check, CheckStatus, Notification, NotificationId, NotificationKind, UserId};
use crate::storage::{CheckFilter, Storage};

/// Number of notifications returned by a listing unless told otherwise
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// How many reminders one generation pass created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    pub due_soon: usize,
    pub overdue: usize,
}

impl GenerationSummary {
    pub fn total(&self) -> usize {
        self.due_soon + self.overdue
    }
}

/// Service for notifications
pub struct NotificationService<'a> {
    storage: &'a Storage,
}

impl<'a> NotificationService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create `due_soon` reminders for open checks due within `days` of `today`
    pub fn generate_due_notifications(&self, today: NaiveDate, days: u32) -> CheckdeskResult<usize> {
        let until = today
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX);
        let due = self
            .storage
            .checks()
            .list(&CheckFilter::open_due_between(today, until))?;

        let mut created = 0;
        for details in due {
            let check = &details.check;
            if self
                .storage
                .notifications()
                .exists_for_day(NotificationKind::DueSoon, check.id, today)?
            {
                continue;
            }

            let remaining = check.days_until_due(today);
            let when = match remaining {
                0 => "today".to_string(),
                1 => "tomorrow".to_string(),
                n => format!("in {} days", n),
            };
            let notification = Notification::new(
                NotificationKind::DueSoon,
                "Check due soon",
                format!(
                    "Check #{} from {} ({}) falls due {} on {}",
                    check.number,
                    details.client_name,
                    check.amount.format_with_symbol(&check.currency),
                    when,
                    check.due_date
                ),
                Some(check.id),
            )
            .on(today);
            self.storage.notifications().insert(&notification)?;
            created += 1;
        }

        debug!("event=notify_due status=ok day={} created={}", today, created);
        Ok(created)
    }

    /// Create `overdue` reminders for open checks past their due date
    pub fn generate_overdue(&self, today: NaiveDate) -> CheckdeskResult<usize> {
        let overdue = self.storage.checks().list(&CheckFilter::overdue(today))?;

        let mut created = 0;
        for details in overdue {
            let check = &details.check;
            if self
                .storage
                .notifications()
                .exists_for_day(NotificationKind::Overdue, check.id, today)?
            {
                continue;
            }

            let notification = Notification::new(
                NotificationKind::Overdue,
                "Check overdue",
                format!(
                    "Check #{} from {} ({}) was due on {}, {} day(s) ago",
                    check.number,
                    details.client_name,
                    check.amount.format_with_symbol(&check.currency),
                    check.due_date,
                    -check.days_until_due(today)
                ),
                Some(check.id),
            )
            .on(today);
            self.storage.notifications().insert(&notification)?;
            created += 1;
        }

        debug!("event=notify_overdue status=ok day={} created={}", today, created);
        Ok(created)
    }

    /// Run both reminder passes for `today`
    pub fn generate_all(&self, today: NaiveDate, days: u32) -> CheckdeskResult<GenerationSummary> {
        let summary = GenerationSummary {
            due_soon: self.generate_due_notifications(today, days)?,
            overdue: self.generate_overdue(today)?,
        };
        if summary.total() > 0 {
            info!(
                "event=notify_generate status=ok day={} due_soon={} overdue={}",
                today, summary.due_soon, summary.overdue
            );
        }
        Ok(summary)
    }

    /// Record that a check reached a final status
    ///
    /// Returns `None` for statuses that do not notify.
    pub fn notify_status_change(
        &self,
        check: &Check,
        user_id: Option<UserId>,
    ) -> CheckdeskResult<Option<Notification>> {
        let message = match check.status {
            CheckStatus::Cashed => format!("Check #{} was cashed successfully", check.number),
            CheckStatus::Bounced => format!("Check #{} was rejected by the bank", check.number),
            CheckStatus::Cancelled => format!("Check #{} was cancelled", check.number),
            CheckStatus::Pending | CheckStatus::Deposited => return Ok(None),
        };

        let notification = Notification::new(
            NotificationKind::StatusChange,
            "Status changed",
            message,
            Some(check.id),
        )
        .for_user(user_id);
        self.storage.notifications().insert(&notification)?;
        Ok(Some(notification))
    }

    /// Newest first; `user_id` also sees broadcast notifications
    pub fn list(
        &self,
        user_id: Option<UserId>,
        unread_only: bool,
        limit: usize,
    ) -> CheckdeskResult<Vec<Notification>> {
        self.storage.notifications().list(user_id, unread_only, limit)
    }

    pub fn count_unread(&self, user_id: Option<UserId>) -> CheckdeskResult<u64> {
        self.storage.notifications().count_unread(user_id)
    }

    /// Resolve a notification `viewer` can see, as `list` would show it
    ///
    /// Another user's notification is reported as not found.
    pub fn find(&self, identifier: &str, viewer: Option<UserId>) -> CheckdeskResult<Notification> {
        let id = self
            .storage
            .notifications()
            .resolve(identifier)?
            .ok_or_else(|| CheckdeskError::notification_not_found(identifier))?;
        let notification = self.get_required(id)?;
        match (viewer, notification.user_id) {
            (Some(viewer), Some(owner)) if viewer != owner => {
                Err(CheckdeskError::notification_not_found(identifier))
            }
            _ => Ok(notification),
        }
    }

    fn get_required(&self, id: NotificationId) -> CheckdeskResult<Notification> {
        self.storage
            .notifications()
            .get(id)?
            .ok_or_else(|| CheckdeskError::notification_not_found(id.to_string()))
    }

    pub fn mark_read(&self, id: NotificationId) -> CheckdeskResult<()> {
        if !self.storage.notifications().mark_read(id)? {
            return Err(CheckdeskError::notification_not_found(id.to_string()));
        }
        Ok(())
    }

    pub fn mark_all_read(&self, user_id: Option<UserId>) -> CheckdeskResult<usize> {
        self.storage.notifications().mark_all_read(user_id)
    }

    pub fn delete(&self, id: NotificationId) -> CheckdeskResult<()> {
        let notification = self.get_required(id)?;
        self.storage.notifications().delete(id)?;
        self.storage.log_delete(
            EntityType::Notification,
            notification.id.to_string(),
            Some(notification.title.clone()),
            &notification,
        )?;
        Ok(())
    }

    /// Delete notifications; with `read_only` the unread ones are kept
    pub fn clear(&self, read_only: bool) -> CheckdeskResult<usize> {
        let removed = self.storage.notifications().clear(read_only)?;
        info!("event=notify_clear status=ok removed={} read_only={}", removed, read_only);
        Ok(removed)
    }
}
