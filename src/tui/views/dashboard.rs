//! Dashboard view
//!
//! Stat cards, a bar chart of checks per status and the top banks.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::display::format_percentage;
use crate::services::dashboard::DashboardStats;
use crate::tui::app::App;
use crate::tui::layout::{columns, DashboardLayout};

use super::{status_color, truncate_string};

pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some(stats) = app.stats.as_ref() else {
        let text = Paragraph::new("Loading...").block(Block::default().borders(Borders::ALL));
        frame.render_widget(text, area);
        return;
    };

    let layout = DashboardLayout::new(area);
    render_cards(frame, stats, layout.cards);
    render_status_chart(frame, stats, layout.chart);
    render_top_banks(frame, stats, layout.banks);
}

fn render_cards(frame: &mut Frame, stats: &DashboardStats, area: Rect) {
    let collection = stats
        .collection_rate()
        .map(format_percentage)
        .unwrap_or_else(|| "-".to_string());

    let cards = [
        ("Total", stats.total_count, stats.total_amount.grouped(), Color::Cyan),
        ("Overdue", stats.overdue_count, stats.overdue_amount.grouped(), Color::Red),
        ("Due soon", stats.due_soon_count, stats.due_soon_amount.grouped(), Color::Yellow),
    ];
    let areas = columns(area, 4);

    for ((title, count, amount, color), card_area) in cards.into_iter().zip(areas.iter()) {
        let lines = vec![
            Line::from(Span::styled(
                format!("{} check(s)", count),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(amount),
        ];
        frame.render_widget(Paragraph::new(lines).block(card_block(title)), *card_area);
    }

    let lines = vec![
        Line::from(Span::styled(
            collection,
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from("cashed of closed"),
    ];
    frame.render_widget(Paragraph::new(lines).block(card_block("Collected")), areas[3]);
}

fn card_block(title: &str) -> Block<'_> {
    Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
}

fn render_status_chart(frame: &mut Frame, stats: &DashboardStats, area: Rect) {
    let bars: Vec<Bar> = stats
        .by_status
        .iter()
        .map(|total| {
            Bar::default()
                .value(total.count)
                .label(Line::from(total.status.to_string()))
                .style(Style::default().fg(status_color(total.status)))
        })
        .collect();

    let chart = BarChart::default()
        .block(card_block("Checks by status"))
        .data(BarGroup::default().bars(&bars))
        .bar_width(9)
        .bar_gap(2)
        .value_style(Style::default().fg(Color::Black).bg(Color::White));

    frame.render_widget(chart, area);
}

fn render_top_banks(frame: &mut Frame, stats: &DashboardStats, area: Rect) {
    if stats.top_banks.is_empty() {
        let text = Paragraph::new("No checks recorded yet.")
            .block(card_block("Top banks"))
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(text, area);
        return;
    }

    let header = Row::new(vec![
        Cell::from("Bank"),
        Cell::from("Checks"),
        Cell::from("Amount"),
    ])
    .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = stats
        .top_banks
        .iter()
        .map(|bank| {
            Row::new(vec![
                Cell::from(truncate_string(&bank.bank_name, 24)),
                Cell::from(bank.count.to_string()),
                Cell::from(bank.amount.grouped()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Min(16),
        Constraint::Length(7),
        Constraint::Length(16),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(card_block("Top banks"));

    frame.render_widget(table, area);
}
