//! User and notification display formatting

use chrono::{DateTime, Utc};
use tabled::Tabled;

use crate::models::{Notification, User};

use super::report::{or_dash, render};

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Name")]
    full_name: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Last Login")]
    last_login: String,
}

#[derive(Tabled)]
struct NotificationRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = " ")]
    unread: &'static str,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Message")]
    message: String,
}

fn user_status(user: &User, now: DateTime<Utc>) -> String {
    if !user.active {
        "Inactive".to_string()
    } else if user.is_locked(now) {
        "Locked".to_string()
    } else {
        "Active".to_string()
    }
}

pub fn format_user_list(users: &[User], now: DateTime<Utc>) -> String {
    if users.is_empty() {
        return "No users found.".to_string();
    }

    let rows = users
        .iter()
        .map(|user| UserRow {
            id: user.id.to_string(),
            username: user.username.clone(),
            full_name: or_dash(&user.full_name).to_string(),
            role: user.role.to_string(),
            status: user_status(user, now),
            last_login: user
                .last_login
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "never".to_string()),
        })
        .collect();
    render(rows, &[])
}

pub fn format_user_details(user: &User, now: DateTime<Utc>) -> String {
    let mut output = String::new();
    output.push_str(&format!("User: {}\n", user.username));
    output.push_str(&format!("  ID:        {}\n", user.id));
    output.push_str(&format!("  Name:      {}\n", or_dash(&user.full_name)));
    output.push_str(&format!("  Email:     {}\n", or_dash(&user.email)));
    output.push_str(&format!("  Role:      {}\n", user.role));
    output.push_str(&format!("  Status:    {}\n", user_status(user, now)));
    if let Some(until) = user.locked_until.filter(|until| *until > now) {
        output.push_str(&format!(
            "  Locked:    until {}\n",
            until.format("%Y-%m-%d %H:%M")
        ));
    }
    output.push_str(&format!(
        "  Created:   {}\n",
        user.created_at.format("%Y-%m-%d")
    ));
    output
}

pub fn format_notification_list(notifications: &[Notification]) -> String {
    if notifications.is_empty() {
        return "No notifications.".to_string();
    }

    let rows = notifications
        .iter()
        .map(|n| NotificationRow {
            id: n.id.to_string(),
            unread: if n.read { "" } else { "●" },
            date: n.for_date.to_string(),
            kind: n.kind.to_string(),
            title: n.title.clone(),
            message: n.message.clone(),
        })
        .collect();
    render(rows, &[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NotificationKind, Role};
    use chrono::Duration;

    #[test]
    fn test_user_status() {
        let now = Utc::now();
        let mut user = User::new("amina", String::new(), Role::Agent);
        assert!(format_user_list(&[user.clone()], now).contains("Active"));

        user.locked_until = Some(now + Duration::minutes(10));
        assert!(format_user_list(&[user.clone()], now).contains("Locked"));
        assert!(format_user_details(&user, now).contains("Locked:    until"));

        user.active = false;
        assert!(format_user_list(&[user], now).contains("Inactive"));
    }

    #[test]
    fn test_notification_list() {
        let notification = Notification::new(
            NotificationKind::Overdue,
            "Check 123 overdue",
            "Due 3 days ago",
            None,
        );
        let output = format_notification_list(&[notification]);
        assert!(output.contains("Check 123 overdue"));
        assert!(output.contains("Overdue"));
        assert_eq!(format_notification_list(&[]), "No notifications.");
    }
}
