//! Status change confirmation
//!
//! Shows the check being changed and its old and new status. `y`/Enter
//! applies the change, `n`/Esc keeps the check as it is.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::models::CheckStatus;
use crate::tui::app::PendingStatusChange;
use crate::tui::layout::centered_rect_fixed;
use crate::tui::views::{status_color, truncate_string};

const WIDTH: u16 = 54;

fn status_span(status: CheckStatus) -> Span<'static> {
    Span::styled(
        status.to_string(),
        Style::default()
            .fg(status_color(status))
            .add_modifier(Modifier::BOLD),
    )
}

pub fn render(frame: &mut Frame, pending: &PendingStatusChange) {
    let area = centered_rect_fixed(WIDTH, 9, frame.area());
    frame.render_widget(Clear, area);

    // Bounced and cancelled checks stop being tracked as open
    let accent = match pending.status {
        CheckStatus::Bounced | CheckStatus::Cancelled => Color::Red,
        _ => Color::Yellow,
    };
    let block = Block::default()
        .title(format!(" Check {} ", truncate_string(&pending.number, 20)))
        .title_style(Style::default().fg(accent).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent));

    let label = Style::default().fg(Color::DarkGray);
    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(" Client  ", label),
            Span::raw(truncate_string(&pending.client_name, (WIDTH - 12) as usize)),
        ]),
        Line::from(vec![Span::styled(" Amount  ", label), Span::raw(pending.amount.clone())]),
        Line::from(vec![
            Span::styled(" Status  ", label),
            status_span(pending.from),
            Span::raw(" -> "),
            status_span(pending.status),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(" [y/Enter]", Style::default().fg(Color::Green)),
            Span::raw(" Apply  "),
            Span::styled("[n/Esc]", Style::default().fg(Color::Red)),
            Span::raw(" Keep"),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
