//! Application state for the TUI
//!
//! The App struct holds all state needed for rendering and handling events.
//! Data is loaded up front and reloaded after every change.

use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};

use crate::config::settings::Settings;
use crate::error::CheckdeskResult;
use crate::models::{CheckDetails, CheckId, CheckStatus, Notification, Permission, User};
use crate::services::dashboard::DashboardStats;
use crate::services::user::require_permission;
use crate::services::{CheckService, DashboardService, NotificationService};
use crate::storage::{CheckFilter, Storage};

/// How long a status message stays on screen
const MESSAGE_TTL: Duration = Duration::from_secs(5);

/// Notifications shown in the list
const NOTIFICATION_LIMIT: usize = 200;

/// Which view is currently active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    #[default]
    Dashboard,
    Checks,
    Notifications,
}

impl ActiveView {
    pub const ALL: [ActiveView; 3] = [Self::Dashboard, Self::Checks, Self::Notifications];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Checks => "Checks",
            Self::Notifications => "Notifications",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Dashboard => 0,
            Self::Checks => 1,
            Self::Notifications => 2,
        }
    }
}

/// A status change waiting for confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingStatusChange {
    pub check_id: CheckId,
    pub number: String,
    pub client_name: String,
    pub amount: String,
    pub from: CheckStatus,
    pub status: CheckStatus,
}

/// Currently active dialog (if any)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ActiveDialog {
    #[default]
    None,
    Help,
    ConfirmStatus(PendingStatusChange),
}

/// Main application state
pub struct App<'a> {
    pub storage: &'a Storage,
    pub settings: &'a Settings,
    /// The logged-in user; actions are checked against their role
    pub user: &'a User,

    pub should_quit: bool,
    pub active_view: ActiveView,
    pub active_dialog: ActiveDialog,
    pub today: NaiveDate,

    pub stats: Option<DashboardStats>,

    /// Only checks in this status, or all
    pub status_filter: Option<CheckStatus>,
    pub checks: Vec<CheckDetails>,
    pub selected_check_index: usize,

    pub notifications: Vec<Notification>,
    pub selected_notification_index: usize,

    status_message: Option<(String, Instant)>,
}

impl<'a> App<'a> {
    pub fn new(storage: &'a Storage, settings: &'a Settings, user: &'a User) -> Self {
        Self {
            storage,
            settings,
            user,
            should_quit: false,
            active_view: ActiveView::default(),
            active_dialog: ActiveDialog::None,
            today: Local::now().date_naive(),
            stats: None,
            status_filter: None,
            checks: Vec::new(),
            selected_check_index: 0,
            notifications: Vec::new(),
            selected_notification_index: 0,
            status_message: None,
        }
    }

    /// Reload everything the views show
    pub fn refresh(&mut self) -> CheckdeskResult<()> {
        let days = self.settings.notification_days;
        self.stats = Some(DashboardService::new(self.storage).stats(self.today, days)?);

        let mut filter = CheckFilter::default();
        if let Some(status) = self.status_filter {
            filter = filter.with_status(status);
        }
        self.checks = CheckService::new(self.storage).list(&filter)?;
        self.selected_check_index = clamp_index(self.selected_check_index, self.checks.len());

        self.notifications = NotificationService::new(self.storage).list(
            Some(self.user.id),
            false,
            NOTIFICATION_LIMIT,
        )?;
        self.selected_notification_index =
            clamp_index(self.selected_notification_index, self.notifications.len());
        Ok(())
    }

    /// Refresh and show any failure in the status bar
    pub fn reload(&mut self) {
        if let Err(e) = self.refresh() {
            self.set_status(format!("Reload failed: {}", e));
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn switch_view(&mut self, view: ActiveView) {
        self.active_view = view;
    }

    pub fn has_dialog(&self) -> bool {
        self.active_dialog != ActiveDialog::None
    }

    pub fn open_dialog(&mut self, dialog: ActiveDialog) {
        self.active_dialog = dialog;
    }

    pub fn close_dialog(&mut self) {
        self.active_dialog = ActiveDialog::None;
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_ref().map(|(message, _)| message.as_str())
    }

    /// Drop the status message once it is old enough
    pub fn tick(&mut self) {
        if let Some((_, shown_at)) = &self.status_message {
            if shown_at.elapsed() >= MESSAGE_TTL {
                self.status_message = None;
            }
        }
    }

    pub fn move_down(&mut self) {
        match self.active_view {
            ActiveView::Checks => {
                if self.selected_check_index + 1 < self.checks.len() {
                    self.selected_check_index += 1;
                }
            }
            ActiveView::Notifications => {
                if self.selected_notification_index + 1 < self.notifications.len() {
                    self.selected_notification_index += 1;
                }
            }
            ActiveView::Dashboard => {}
        }
    }

    pub fn move_up(&mut self) {
        match self.active_view {
            ActiveView::Checks => {
                self.selected_check_index = self.selected_check_index.saturating_sub(1)
            }
            ActiveView::Notifications => {
                self.selected_notification_index = self.selected_notification_index.saturating_sub(1)
            }
            ActiveView::Dashboard => {}
        }
    }

    /// All, then each status in turn
    pub fn cycle_status_filter(&mut self) {
        self.status_filter = match self.status_filter {
            None => Some(CheckStatus::ALL[0]),
            Some(current) => CheckStatus::ALL
                .iter()
                .position(|s| *s == current)
                .and_then(|i| CheckStatus::ALL.get(i + 1))
                .copied(),
        };
        self.selected_check_index = 0;
        self.reload();
    }

    pub fn selected_check(&self) -> Option<&CheckDetails> {
        self.checks.get(self.selected_check_index)
    }

    pub fn selected_notification(&self) -> Option<&Notification> {
        self.notifications.get(self.selected_notification_index)
    }

    /// Ask for confirmation before moving the selected check to `status`
    pub fn request_status_change(&mut self, status: CheckStatus) {
        if let Err(e) = require_permission(self.user, Permission::CheckUpdate) {
            self.set_status(e.to_string());
            return;
        }
        let Some(details) = self.selected_check() else {
            return;
        };
        if details.check.status == status {
            let message = format!("Check {} is already {}", details.check.number, status);
            self.set_status(message);
            return;
        }
        let pending = PendingStatusChange {
            check_id: details.check.id,
            number: details.check.number.clone(),
            client_name: details.client_name.clone(),
            amount: details.check.amount.format_with_symbol(&details.check.currency),
            from: details.check.status,
            status,
        };
        self.open_dialog(ActiveDialog::ConfirmStatus(pending));
    }

    /// Apply the status change awaiting confirmation
    pub fn confirm_status_change(&mut self) {
        let ActiveDialog::ConfirmStatus(pending) = std::mem::take(&mut self.active_dialog) else {
            return;
        };
        let result = CheckService::new(self.storage).change_status(
            pending.check_id,
            pending.status,
            Some(self.user.id),
        );
        match result {
            Ok(check) => {
                self.set_status(format!("Check {} is now {}", check.number, check.status));
                self.reload();
            }
            Err(e) => self.set_status(e.to_string()),
        }
    }

    pub fn mark_selected_notification_read(&mut self) {
        let Some(notification) = self.selected_notification() else {
            return;
        };
        if notification.read {
            return;
        }
        let id = notification.id;
        match NotificationService::new(self.storage).mark_read(id) {
            Ok(()) => self.reload(),
            Err(e) => self.set_status(e.to_string()),
        }
    }

    pub fn mark_all_notifications_read(&mut self) {
        match NotificationService::new(self.storage).mark_all_read(Some(self.user.id)) {
            Ok(count) => {
                self.set_status(format!("Marked {} notification(s) as read", count));
                self.reload();
            }
            Err(e) => self.set_status(e.to_string()),
        }
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }
}

fn clamp_index(index: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        index.min(len - 1)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{Bank, Check, Client, ClientKind, Money, Role};

    pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// One bank, one client, three pending checks and an agent user
    pub(crate) fn fixture() -> (Storage, Settings, User) {
        let storage = Storage::open_in_memory().unwrap();
        let bank = Bank::new("Banque Populaire", Some("BP".into()));
        storage.banks().insert(&bank).unwrap();
        let client = Client::new("Atlas SARL", ClientKind::Company);
        storage.clients().insert(&client).unwrap();
        for (i, due) in [date(2024, 3, 1), date(2024, 3, 5), date(2024, 4, 1)].into_iter().enumerate() {
            let check = Check::new(
                format!("00{}", i + 1),
                Money::from_units(1_000 * (i as i64 + 1), 0),
                "MAD",
                date(2024, 2, 1),
                due,
                client.id,
                bank.id,
            );
            storage.checks().insert(&check).unwrap();
        }
        let user = User::new("agent", "unused".into(), Role::Agent);
        storage.users().insert(&user).unwrap();
        (storage, Settings::default(), user)
    }

    fn app<'a>(storage: &'a Storage, settings: &'a Settings, user: &'a User) -> App<'a> {
        let mut app = App::new(storage, settings, user);
        app.today = date(2024, 3, 3);
        app.refresh().unwrap();
        app
    }

    #[test]
    fn test_refresh_loads_views() {
        let (storage, settings, user) = fixture();
        let app = app(&storage, &settings, &user);
        assert_eq!(app.checks.len(), 3);
        let stats = app.stats.as_ref().unwrap();
        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.overdue_count, 1);
    }

    #[test]
    fn test_navigation_stays_in_bounds() {
        let (storage, settings, user) = fixture();
        let mut app = app(&storage, &settings, &user);
        app.switch_view(ActiveView::Checks);
        app.move_up();
        assert_eq!(app.selected_check_index, 0);
        for _ in 0..10 {
            app.move_down();
        }
        assert_eq!(app.selected_check_index, 2);
    }

    #[test]
    fn test_cycle_status_filter() {
        let (storage, settings, user) = fixture();
        let mut app = app(&storage, &settings, &user);

        app.cycle_status_filter();
        assert_eq!(app.status_filter, Some(CheckStatus::Pending));
        assert_eq!(app.checks.len(), 3);

        app.cycle_status_filter();
        assert_eq!(app.status_filter, Some(CheckStatus::Deposited));
        assert!(app.checks.is_empty());

        for _ in 0..4 {
            app.cycle_status_filter();
        }
        assert_eq!(app.status_filter, None);
        assert_eq!(app.checks.len(), 3);
    }

    #[test]
    fn test_status_change_needs_confirmation() {
        let (storage, settings, user) = fixture();
        let mut app = app(&storage, &settings, &user);
        app.switch_view(ActiveView::Checks);

        app.request_status_change(CheckStatus::Cashed);
        assert!(matches!(app.active_dialog, ActiveDialog::ConfirmStatus(_)));
        let id = app.selected_check().unwrap().check.id;

        app.confirm_status_change();
        assert!(!app.has_dialog());
        let check = storage.checks().get(id).unwrap().unwrap();
        assert_eq!(check.status, CheckStatus::Cashed);
        assert!(app.status_message().unwrap().contains("Cashed"));
        assert_eq!(app.unread_count(), 1);
    }

    #[test]
    fn test_read_only_user_cannot_change_status() {
        let (storage, settings, _) = fixture();
        let viewer = User::new("viewer", "unused".into(), Role::ReadOnly);
        storage.users().insert(&viewer).unwrap();
        let mut app = app(&storage, &settings, &viewer);

        app.request_status_change(CheckStatus::Bounced);
        assert!(!app.has_dialog());
        assert!(app.status_message().is_some());
    }

    #[test]
    fn test_mark_notifications_read() {
        let (storage, settings, user) = fixture();
        let mut app = app(&storage, &settings, &user);
        app.request_status_change(CheckStatus::Bounced);
        app.confirm_status_change();
        assert_eq!(app.unread_count(), 1);

        app.switch_view(ActiveView::Notifications);
        app.mark_selected_notification_read();
        assert_eq!(app.unread_count(), 0);
    }
}
