//! In-app notifications about due dates and status changes

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CheckId, NotificationId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    DueSoon,
    Overdue,
    StatusChange,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DueSoon => "due_soon",
            Self::Overdue => "overdue",
            Self::StatusChange => "status_change",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "due_soon" | "due-soon" | "echeance" => Some(Self::DueSoon),
            "overdue" | "retard" => Some(Self::Overdue),
            "status_change" | "status-change" | "status" => Some(Self::StatusChange),
            _ => None,
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DueSoon => write!(f, "Due soon"),
            Self::Overdue => write!(f, "Overdue"),
            Self::StatusChange => write!(f, "Status change"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub check_id: Option<CheckId>,
    /// None means every user sees it
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub read: bool,
    /// Day the notification was raised for; due reminders are unique per day
    pub for_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        check_id: Option<CheckId>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            kind,
            title: title.into(),
            message: message.into(),
            check_id,
            user_id: None,
            read: false,
            for_date: Utc::now().date_naive(),
            created_at: Utc::now(),
        }
    }

    pub fn on(mut self, day: NaiveDate) -> Self {
        self.for_date = day;
        self
    }

    pub fn for_user(mut self, user_id: Option<UserId>) -> Self {
        self.user_id = user_id;
        self
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.title, self.message)
    }
}
