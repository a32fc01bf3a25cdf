use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use logtally_analytics::DashboardSnapshot;
use logtally_types::day_name;

use crate::ui::{Theme, components::heat_level};

/// Shades for heat levels 0 (no traffic) through 4
const SHADES: [&str; 5] = ["··", "░░", "▒▒", "▓▓", "██"];

/// Weekly traffic grid: one row per day of week, one column per hour
pub struct HeatmapPanel;

impl HeatmapPanel {
    pub fn render(frame: &mut Frame, area: Rect, snapshot: &DashboardSnapshot) {
        let peak = snapshot.heatmap_peak();
        let levels = SHADES.len() - 1;

        let mut lines = Vec::with_capacity(10);

        // Hour axis, labelled every three hours
        let mut axis = vec![Span::raw("     ")];
        for hour in 0..24 {
            let label = if hour % 3 == 0 {
                format!("{:02} ", hour)
            } else {
                "   ".to_string()
            };
            axis.push(Span::styled(label, Theme::text_dim()));
        }
        lines.push(Line::from(axis));

        for day in 1..=7 {
            let mut spans = vec![Span::styled(
                format!(" {:<3} ", &day_name(day)[..3]),
                Theme::text_dim(),
            )];
            for hour in 0..24 {
                let level = heat_level(snapshot.heatmap_count(day, hour), peak, levels);
                spans.push(Span::styled(
                    format!("{} ", SHADES[level]),
                    Style::default().fg(Theme::HEAT[level]),
                ));
            }
            lines.push(Line::from(spans));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(" Peak cell: ", Theme::text_dim()),
            Span::styled(format!("{} requests", peak), Theme::text_highlight()),
        ]));

        let widget = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border_focused())
                .title(Span::styled(" Traffic Heatmap (day x hour) ", Theme::title())),
        );
        frame.render_widget(widget, area);
    }
}
