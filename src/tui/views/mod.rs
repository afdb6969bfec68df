//! TUI Views module
//!
//! The dashboard, check list and notification list, plus the tab bar and
//! status bar around them.

pub mod checks;
pub mod dashboard;
pub mod notifications;
pub mod status_bar;

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Tabs},
    Frame,
};

use super::app::{ActiveDialog, ActiveView, App};
use super::dialogs;
use super::layout::AppLayout;

/// Render the entire application
pub fn render(frame: &mut Frame, app: &mut App) {
    let layout = AppLayout::new(frame.area());

    render_tabs(frame, app, layout.tabs);

    match app.active_view {
        ActiveView::Dashboard => dashboard::render(frame, app, layout.main),
        ActiveView::Checks => checks::render(frame, app, layout.main),
        ActiveView::Notifications => notifications::render(frame, app, layout.main),
    }

    status_bar::render(frame, app, layout.status_bar);

    match &app.active_dialog {
        ActiveDialog::Help => dialogs::help::render(frame, app),
        ActiveDialog::ConfirmStatus(pending) => dialogs::confirm::render(frame, pending),
        ActiveDialog::None => {}
    }
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = ActiveView::ALL
        .iter()
        .map(|view| {
            let label = match view {
                ActiveView::Notifications if app.unread_count() > 0 => {
                    format!("{} ({})", view.title(), app.unread_count())
                }
                _ => view.title().to_string(),
            };
            Line::from(format!("{} {}", view.index() + 1, label))
        })
        .collect();

    let company = app.settings.company_name.trim();
    let title = if company.is_empty() {
        " checkdesk ".to_string()
    } else {
        format!(" checkdesk - {} ", company)
    };

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .title(title)
                .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .select(app.active_view.index())
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(tabs, area);
}

/// Cut `s` to at most `max_len` characters
pub(crate) fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let mut cut: String = s.chars().take(max_len.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

/// Colour used for a check status everywhere in the TUI
pub(crate) fn status_color(status: crate::models::CheckStatus) -> Color {
    use crate::models::CheckStatus;
    match status {
        CheckStatus::Pending => Color::Yellow,
        CheckStatus::Deposited => Color::Blue,
        CheckStatus::Cashed => Color::Green,
        CheckStatus::Bounced => Color::Red,
        CheckStatus::Cancelled => Color::DarkGray,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::app::tests::fixture;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Atlas", 10), "Atlas");
        assert_eq!(truncate_string("Atlas SARL Casablanca", 6), "Atlas…");
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_renders_every_view() {
        let (storage, settings, user) = fixture();
        let mut app = App::new(&storage, &settings, &user);
        app.refresh().unwrap();
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();

        for view in ActiveView::ALL {
            app.switch_view(view);
            terminal.draw(|frame| render(frame, &mut app)).unwrap();
        }

        app.open_dialog(ActiveDialog::Help);
        terminal.draw(|frame| render(frame, &mut app)).unwrap();
        assert!(screen_text(&terminal).contains("Keyboard"));

        app.close_dialog();
        app.switch_view(ActiveView::Checks);
        terminal.draw(|frame| render(frame, &mut app)).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("Atlas SARL"));
    }

    #[test]
    fn test_dashboard_shows_collection_rate() {
        let (storage, settings, user) = fixture();
        let mut check = storage.checks().list(&Default::default()).unwrap()[0].check.clone();
        check.status = crate::models::CheckStatus::Cashed;
        storage.checks().update(&check).unwrap();

        let mut app = App::new(&storage, &settings, &user);
        app.refresh().unwrap();
        app.switch_view(ActiveView::Dashboard);
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| render(frame, &mut app)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("Collected"));
        assert!(text.contains("100%"));
    }

    #[test]
    fn test_status_dialog_shows_check_and_transition() {
        let (storage, settings, user) = fixture();
        let mut app = App::new(&storage, &settings, &user);
        app.refresh().unwrap();
        app.switch_view(ActiveView::Checks);
        app.request_status_change(crate::models::CheckStatus::Cashed);
        assert!(matches!(app.active_dialog, ActiveDialog::ConfirmStatus(_)));

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| render(frame, &mut app)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("Pending -> Cashed"));
        assert!(text.contains("Atlas SARL"));
        assert!(text.contains("MAD"));
        assert!(text.contains("[n/Esc] Keep"));
    }
}
