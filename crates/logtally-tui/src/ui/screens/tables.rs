//! Ranked table panels

use ratatui::{
    Frame,
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table, TableState},
};

use logtally_analytics::DashboardSnapshot;
use logtally_types::Fixed2;

use crate::ui::{Theme, components::bar};

const BAR_WIDTH: usize = 20;

fn panel_block(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Theme::border_focused())
        .title(Span::styled(title, Theme::title()))
}

/// Titled table, or a placeholder message when there are no rows
struct RankedTable<'a> {
    title: String,
    header: Vec<&'a str>,
    widths: Vec<Constraint>,
    rows: Vec<Row<'a>>,
    empty: &'a str,
}

impl RankedTable<'_> {
    fn render(self, frame: &mut Frame, area: Rect, table_state: &mut TableState) {
        if self.rows.is_empty() {
            let message = Line::from(Span::styled(self.empty, Theme::text_dim()));
            let placeholder = Paragraph::new(message).block(panel_block(self.title));
            frame.render_widget(placeholder, area);
            return;
        }

        let table = Table::new(self.rows, self.widths)
            .header(Row::new(self.header).style(Theme::table_header()))
            .block(panel_block(self.title))
            .row_highlight_style(Theme::row_selected());

        frame.render_stateful_widget(table, area, table_state);
    }
}

/// Most active client addresses with their share of all requests
pub struct TopIpsPanel;

impl TopIpsPanel {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        snapshot: &DashboardSnapshot,
        table_state: &mut TableState,
    ) {
        let total = snapshot.stats.total_records;
        let max = snapshot.top_ips.first().map_or(0, |r| r.request_count);

        let rows = snapshot
            .top_ips
            .iter()
            .enumerate()
            .map(|(i, row)| {
                Row::new(vec![
                    Span::styled((i + 1).to_string(), Theme::text_dim()),
                    Span::styled(row.ip_address.clone(), Theme::text()),
                    Span::styled(row.request_count.to_string(), Theme::text()),
                    Span::styled(
                        format!("{}%", Fixed2::percentage(row.request_count, total)),
                        Theme::text(),
                    ),
                    Span::styled(bar(row.request_count, max, BAR_WIDTH), Theme::bar()),
                ])
            })
            .collect();

        RankedTable {
            title: format!(" Top {} IP Addresses ", snapshot.top_ips.len()),
            header: vec!["Rank", "IP Address", "Requests", "Share", ""],
            widths: vec![
                Constraint::Length(5),
                Constraint::Length(16),
                Constraint::Length(10),
                Constraint::Length(8),
                Constraint::Min(BAR_WIDTH as u16),
            ],
            rows,
            empty: "No data available.",
        }
        .render(frame, area, table_state);
    }
}

/// Most requested resources with average response size
pub struct ResourcesPanel;

impl ResourcesPanel {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        snapshot: &DashboardSnapshot,
        table_state: &mut TableState,
    ) {
        let rows = snapshot
            .resources
            .iter()
            .enumerate()
            .map(|(i, row)| {
                Row::new(vec![
                    Span::styled((i + 1).to_string(), Theme::text_dim()),
                    Span::styled(row.resource.clone(), Theme::text()),
                    Span::styled(row.request_count.to_string(), Theme::text()),
                    Span::styled(row.avg_size.to_string(), Theme::text()),
                ])
            })
            .collect();

        RankedTable {
            title: format!(" Top {} Requested Resources ", snapshot.resources.len()),
            header: vec!["Rank", "Resource", "Requests", "Avg Size"],
            widths: vec![
                Constraint::Length(5),
                Constraint::Min(20),
                Constraint::Length(10),
                Constraint::Length(12),
            ],
            rows,
            empty: "No data available.",
        }
        .render(frame, area, table_state);
    }
}

/// 4xx and 5xx responses with sample resources
pub struct ErrorsPanel;

impl ErrorsPanel {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        snapshot: &DashboardSnapshot,
        table_state: &mut TableState,
    ) {
        let rows = snapshot
            .errors
            .iter()
            .map(|row| {
                Row::new(vec![
                    Span::styled(row.status_code.to_string(), Theme::status_code(row.status_code)),
                    Span::styled(row.error_count.to_string(), Theme::text()),
                    Span::styled(row.samples(), Theme::text_dim()),
                ])
            })
            .collect();

        RankedTable {
            title: " Error Analysis (4xx & 5xx) ".to_string(),
            header: vec!["Status", "Errors", "Sample Resources"],
            widths: vec![
                Constraint::Length(7),
                Constraint::Length(10),
                Constraint::Min(20),
            ],
            rows,
            empty: "No errors found in the logs.",
        }
        .render(frame, area, table_state);
    }
}

/// Requests per date over the trailing window
pub struct DailyPanel;

impl DailyPanel {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        snapshot: &DashboardSnapshot,
        days: u32,
        table_state: &mut TableState,
    ) {
        let max = snapshot
            .daily
            .iter()
            .map(|r| r.request_count)
            .max()
            .unwrap_or(0);

        let rows = snapshot
            .daily
            .iter()
            .map(|row| {
                Row::new(vec![
                    Span::styled(row.date.format("%Y-%m-%d %a").to_string(), Theme::text()),
                    Span::styled(row.request_count.to_string(), Theme::text()),
                    Span::styled(bar(row.request_count, max, BAR_WIDTH * 2), Theme::bar()),
                ])
            })
            .collect();

        RankedTable {
            title: format!(" Daily Traffic (last {} days) ", days),
            header: vec!["Date", "Requests", ""],
            widths: vec![
                Constraint::Length(15),
                Constraint::Length(10),
                Constraint::Min(BAR_WIDTH as u16),
            ],
            rows,
            empty: "No data available.",
        }
        .render(frame, area, table_state);
    }
}
