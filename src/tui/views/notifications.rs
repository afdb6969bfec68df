//! Notification list view

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::tui::app::App;

use super::truncate_string;

pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .title(format!(
            " Notifications ({} unread)  Enter:Mark read  a:Mark all read ",
            app.unread_count()
        ))
        .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    if app.notifications.is_empty() {
        let text = Paragraph::new("No notifications.")
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(text, area);
        return;
    }

    let rows: Vec<Row> = app
        .notifications
        .iter()
        .map(|notification| {
            let style = if notification.read {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            };
            Row::new(vec![
                Cell::from(if notification.read { " " } else { "●" }),
                Cell::from(notification.for_date.format("%Y-%m-%d").to_string()),
                Cell::from(truncate_string(&notification.title, 20)),
                Cell::from(notification.message.clone()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(1),
        Constraint::Length(11),
        Constraint::Length(20),
        Constraint::Min(20),
    ];

    let table = Table::new(rows, widths)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(app.selected_notification_index));

    frame.render_stateful_widget(table, area, &mut state);
}
