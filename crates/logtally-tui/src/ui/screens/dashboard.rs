use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
};

use crate::{
    app::{AppState, Panel},
    ui::{
        Layout, Theme,
        components::{HelpOverlay, StatusBar, dashboard_hints},
        screens::{
            DailyPanel, ErrorsPanel, HeatmapPanel, OverviewPanel, ResourcesPanel, TopIpsPanel,
        },
    },
};

/// Full-screen dashboard: panel tabs, the active panel and a status bar
pub struct DashboardScreen;

impl DashboardScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState) {
        let (header_area, content_area, status_area) = Layout::main(frame.area());

        Self::render_tabs(frame, header_area, state);
        Self::render_panel(frame, content_area, state);
        Self::render_status_bar(frame, status_area, state);

        if state.help_visible {
            HelpOverlay::render(frame);
        }
    }

    fn render_tabs(frame: &mut Frame, area: Rect, state: &AppState) {
        let titles = Panel::ALL
            .iter()
            .enumerate()
            .map(|(i, panel)| Line::from(format!("{} {}", i + 1, panel.title())));

        let tabs = Tabs::new(titles)
            .select(state.panel.index())
            .style(Theme::text_dim())
            .highlight_style(Theme::text_highlight())
            .divider(Span::styled("│", Theme::text_dim()))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Theme::border())
                    .title(Span::styled(" logtally ", Theme::title())),
            );

        frame.render_widget(tabs, area);
    }

    fn render_panel(frame: &mut Frame, area: Rect, state: &mut AppState) {
        let Some(snapshot) = state.snapshot.as_ref() else {
            let loading = Paragraph::new(Line::from(Span::styled(
                "Loading reports...",
                Theme::text_dim(),
            )))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).border_style(Theme::border()));
            frame.render_widget(loading, area);
            return;
        };

        match state.panel {
            Panel::Overview => OverviewPanel::render(frame, area, snapshot),
            Panel::TopIps => TopIpsPanel::render(frame, area, snapshot, &mut state.table_state),
            Panel::Resources => {
                ResourcesPanel::render(frame, area, snapshot, &mut state.table_state)
            }
            Panel::Errors => ErrorsPanel::render(frame, area, snapshot, &mut state.table_state),
            Panel::Heatmap => HeatmapPanel::render(frame, area, snapshot),
            Panel::Daily => {
                DailyPanel::render(frame, area, snapshot, state.days, &mut state.table_state)
            }
        }
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState) {
        let status = StatusBar::new().hints(dashboard_hints());

        let status = if let Some(err) = &state.error_message {
            status.error(err.clone())
        } else if state.refreshing {
            status.right("refreshing...")
        } else if let Some(at) = state.last_refresh {
            status.right(format!("updated {}", at.format("%H:%M:%S")))
        } else {
            status
        };

        frame.render_widget(status, area);
    }
}
