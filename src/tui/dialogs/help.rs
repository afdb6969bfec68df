//! Help dialog
//!
//! Shows the keyboard shortcuts of the current view

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::tui::app::{ActiveView, App};
use crate::tui::layout::centered_rect;

pub fn render(frame: &mut Frame, app: &mut App) {
    let area = centered_rect(60, 70, frame.area());

    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Keyboard shortcuts ")
        .title_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(help_lines(app.active_view))
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

fn help_lines(view: ActiveView) -> Vec<Line<'static>> {
    let mut lines = vec![
        section("Global"),
        key_line("1 / 2 / 3", "Dashboard, checks, notifications"),
        key_line("j / k", "Move selection down / up"),
        key_line("r", "Reload data"),
        key_line("?", "Show/hide help"),
        key_line("q", "Quit"),
        Line::from(""),
    ];

    match view {
        ActiveView::Checks => {
            lines.push(section("Checks"));
            lines.push(key_line("f", "Cycle status filter"));
            lines.push(key_line("d", "Mark deposited"));
            lines.push(key_line("c", "Mark cashed"));
            lines.push(key_line("b", "Mark bounced"));
            lines.push(key_line("x", "Mark cancelled"));
        }
        ActiveView::Notifications => {
            lines.push(section("Notifications"));
            lines.push(key_line("Enter", "Mark as read"));
            lines.push(key_line("a", "Mark all as read"));
        }
        ActiveView::Dashboard => {}
    }

    lines
}

fn section(title: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        title,
        Style::default()
            .add_modifier(Modifier::BOLD)
            .fg(Color::Yellow),
    ))
}

fn key_line(key: &'static str, description: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<12}", key), Style::default().fg(Color::Cyan)),
        Span::raw(description),
    ])
}
