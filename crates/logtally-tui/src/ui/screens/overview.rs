use chrono::{Duration, Local};
use ratatui::{
    Frame,
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Row, Table},
};

use logtally_analytics::DashboardSnapshot;
use logtally_types::{CorpusStats, HourlyCount};

use crate::ui::{Layout, Theme};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Corpus statistics, hourly traffic and status distribution
pub struct OverviewPanel;

impl OverviewPanel {
    pub fn render(frame: &mut Frame, area: Rect, snapshot: &DashboardSnapshot) {
        let (stats_area, hourly_area, status_area) = Layout::overview(area);

        Self::render_stats(frame, stats_area, &snapshot.stats);
        Self::render_hourly(frame, hourly_area, &snapshot.hourly);
        Self::render_status(frame, status_area, snapshot);
    }

    fn render_stats(frame: &mut Frame, area: Rect, stats: &CorpusStats) {
        let now = Local::now().fixed_offset();

        let mut lines = vec![
            Self::stat_line("Total requests", stats.total_records.to_string()),
            Self::stat_line("Unique IPs", stats.unique_ips.to_string()),
        ];
        if let (Some(earliest), Some(latest)) = (stats.earliest, stats.latest) {
            lines.push(Self::stat_line(
                "Log period",
                format!(
                    "{} to {}",
                    earliest.format(TIME_FORMAT),
                    latest.format(TIME_FORMAT)
                ),
            ));
        }
        if let Some(span) = stats.span() {
            lines.push(Self::stat_line("Duration", duration_label(span)));
        }
        lines.push(Self::stat_line(
            "Days analyzed",
            stats.days_analyzed(now).to_string(),
        ));
        lines.push(Self::stat_line(
            "Avg requests/day",
            format!("{:.0}", stats.avg_requests_per_day(now)),
        ));

        let widget = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(" Key Metrics ", Theme::title())),
        );
        frame.render_widget(widget, area);
    }

    fn stat_line(label: &str, value: String) -> Line<'static> {
        Line::from(vec![
            Span::styled(format!(" {:<18}", label), Theme::text_dim()),
            Span::styled(value, Theme::text_highlight()),
        ])
    }

    fn render_hourly(frame: &mut Frame, area: Rect, hourly: &[HourlyCount]) {
        let bars: Vec<Bar> = hours_filled(hourly)
            .into_iter()
            .enumerate()
            .map(|(hour, count)| {
                Bar::default()
                    .value(count)
                    .text_value(String::new())
                    .label(Line::from(format!("{:02}", hour)))
            })
            .collect();

        // Two-cell bars with a one-cell gap fit 24 hours in 72 columns
        let chart = BarChart::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Theme::border())
                    .title(Span::styled(" Hourly Traffic ", Theme::title())),
            )
            .data(BarGroup::default().bars(&bars))
            .bar_width(2)
            .bar_gap(1)
            .bar_style(Theme::bar())
            .label_style(Theme::text_dim());

        frame.render_widget(chart, area);
    }

    fn render_status(frame: &mut Frame, area: Rect, snapshot: &DashboardSnapshot) {
        let rows = snapshot.status.iter().map(|s| {
            Row::new(vec![
                Span::styled(s.status_code.to_string(), Theme::status_code(s.status_code)),
                Span::styled(s.count.to_string(), Theme::text()),
                Span::styled(format!("{}%", s.percentage), Theme::text()),
            ])
        });

        let table = Table::new(
            rows,
            [
                Constraint::Length(7),
                Constraint::Min(8),
                Constraint::Length(8),
            ],
        )
        .header(Row::new(vec!["Status", "Count", "Share"]).style(Theme::table_header()))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(" Status Codes ", Theme::title())),
        );

        frame.render_widget(table, area);
    }
}

/// Request counts for hours 0-23, zero where no row exists
pub(crate) fn hours_filled(hourly: &[HourlyCount]) -> [u64; 24] {
    let mut counts = [0u64; 24];
    for row in hourly {
        if let Some(slot) = counts.get_mut(row.hour as usize) {
            *slot = row.request_count;
        }
    }
    counts
}

/// "N days, H hours"
pub(crate) fn duration_label(span: Duration) -> String {
    let hours = span.num_hours().max(0);
    format!("{} days, {} hours", hours / 24, hours % 24)
}
