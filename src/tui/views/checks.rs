//! Check list view

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::tui::app::App;

use super::{status_color, truncate_string};

pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    render_header(frame, app, chunks[0]);
    render_table(frame, app, chunks[1]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let filter = app
        .status_filter
        .map(|s| s.to_string())
        .unwrap_or_else(|| "All".to_string());
    let title = format!(" Checks: {} ({}) ", filter, app.checks.len());

    let block = Block::default()
        .title(title)
        .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let hints = "f:Filter  d:Deposited  c:Cashed  b:Bounced  x:Cancelled  r:Reload";
    let paragraph = Paragraph::new(hints)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));

    frame.render_widget(paragraph, area);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    if app.checks.is_empty() {
        let text = Paragraph::new("No checks match this filter.")
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(text, area);
        return;
    }

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let header = Row::new(vec![
        Cell::from("Number").style(bold),
        Cell::from("Due").style(bold),
        Cell::from("Client").style(bold),
        Cell::from("Bank").style(bold),
        Cell::from("Amount").style(bold),
        Cell::from("Status").style(bold),
    ])
    .style(Style::default().fg(Color::Yellow))
    .height(1);

    let rows: Vec<Row> = app
        .checks
        .iter()
        .map(|details| {
            let check = &details.check;
            let due_style = if check.status.is_open() && check.due_date < app.today {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(truncate_string(&check.number, 12)),
                Cell::from(check.due_date.format("%Y-%m-%d").to_string()).style(due_style),
                Cell::from(truncate_string(&details.client_name, 24)),
                Cell::from(truncate_string(&details.bank_name, 20)),
                Cell::from(check.amount.format_with_symbol(&check.currency)),
                Cell::from(check.status.to_string())
                    .style(Style::default().fg(status_color(check.status))),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(12),
        Constraint::Length(11),
        Constraint::Min(16),
        Constraint::Length(20),
        Constraint::Length(18),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(app.selected_check_index));

    frame.render_stateful_widget(table, area, &mut state);
}
