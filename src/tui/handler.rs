//! Event handler for the TUI
//!
//! Routes keyboard events to the dialog or the active view.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::models::CheckStatus;

use super::app::{ActiveDialog, ActiveView, App};
use super::event::Event;

/// Handle an incoming event
pub fn handle_event(app: &mut App, event: Event) {
    match event {
        Event::Key(key) => handle_key_event(app, key),
        Event::Tick => app.tick(),
        Event::Resize(_, _) => {}
    }
}

fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.quit();
        return;
    }

    if app.has_dialog() {
        handle_dialog_key(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => app.quit(),
        KeyCode::Char('?') => app.open_dialog(ActiveDialog::Help),
        KeyCode::Char('1') => app.switch_view(ActiveView::Dashboard),
        KeyCode::Char('2') => app.switch_view(ActiveView::Checks),
        KeyCode::Char('3') => app.switch_view(ActiveView::Notifications),
        KeyCode::Char('r') => {
            app.reload();
            app.set_status("Reloaded");
        }
        KeyCode::Char('j') | KeyCode::Down => app.move_down(),
        KeyCode::Char('k') | KeyCode::Up => app.move_up(),
        _ => match app.active_view {
            ActiveView::Checks => handle_checks_key(app, key),
            ActiveView::Notifications => handle_notifications_key(app, key),
            ActiveView::Dashboard => {}
        },
    }
}

fn handle_checks_key(app: &mut App, key: KeyEvent) {
    let status = match key.code {
        KeyCode::Char('f') => {
            app.cycle_status_filter();
            return;
        }
        KeyCode::Char('d') => CheckStatus::Deposited,
        KeyCode::Char('c') => CheckStatus::Cashed,
        KeyCode::Char('b') => CheckStatus::Bounced,
        KeyCode::Char('x') => CheckStatus::Cancelled,
        _ => return,
    };
    app.request_status_change(status);
}

fn handle_notifications_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Char(' ') => app.mark_selected_notification_read(),
        KeyCode::Char('a') => app.mark_all_notifications_read(),
        _ => {}
    }
}

fn handle_dialog_key(app: &mut App, key: KeyEvent) {
    match &app.active_dialog {
        ActiveDialog::ConfirmStatus(_) => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_status_change(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.close_dialog(),
            _ => {}
        },
        ActiveDialog::Help => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.close_dialog();
            }
        }
        ActiveDialog::None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::app::tests::fixture;

    fn press(app: &mut App, code: KeyCode) {
        handle_event(app, Event::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    #[test]
    fn test_view_switching_and_quit() {
        let (storage, settings, user) = fixture();
        let mut app = App::new(&storage, &settings, &user);

        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.active_view, ActiveView::Checks);
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.active_view, ActiveView::Notifications);

        press(&mut app, KeyCode::Char('?'));
        assert!(app.has_dialog());
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.has_dialog());
        assert!(!app.should_quit);

        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_mark_bounced_then_decline_and_confirm() {
        let (storage, settings, user) = fixture();
        let mut app = App::new(&storage, &settings, &user);
        app.refresh().unwrap();

        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Char('j'));
        let id = app.selected_check().unwrap().check.id;

        press(&mut app, KeyCode::Char('b'));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(storage.checks().get(id).unwrap().unwrap().status, CheckStatus::Pending);

        press(&mut app, KeyCode::Char('b'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(storage.checks().get(id).unwrap().unwrap().status, CheckStatus::Bounced);
    }

    #[test]
    fn test_status_keys_ignored_on_dashboard() {
        let (storage, settings, user) = fixture();
        let mut app = App::new(&storage, &settings, &user);
        app.refresh().unwrap();

        press(&mut app, KeyCode::Char('c'));
        assert!(!app.has_dialog());
    }
}
