use ratatui::{
    Frame,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::ui::Layout;

/// Help overlay showing keybindings
pub struct HelpOverlay;

impl HelpOverlay {
    pub fn render(frame: &mut Frame) {
        let popup_area = Layout::popup(frame.area(), 46, 22);

        // Clear the background
        frame.render_widget(Clear, popup_area);

        let help_text = vec![
            Line::from(Span::styled(
                "Keybindings",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled("Panels", Style::default().fg(Color::Yellow))),
            Self::key_line("Tab/l/→", "Next panel"),
            Self::key_line("S-Tab/h/←", "Previous panel"),
            Self::key_line("1-6", "Jump to panel"),
            Line::from(""),
            Line::from(Span::styled("Tables", Style::default().fg(Color::Yellow))),
            Self::key_line("j/↓", "Next row"),
            Self::key_line("k/↑", "Previous row"),
            Self::key_line("g", "First row"),
            Self::key_line("+/-", "More/fewer ranked rows"),
            Line::from(""),
            Line::from(Span::styled("Actions", Style::default().fg(Color::Yellow))),
            Self::key_line("r", "Refresh reports"),
            Self::key_line("?", "Toggle this help"),
            Self::key_line("q/Esc", "Quit"),
        ];

        let help_widget = Paragraph::new(help_text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(Span::styled(
                    " Help ",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )),
        );

        frame.render_widget(help_widget, popup_area);
    }

    fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
        Line::from(vec![
            Span::styled(format!("  {:>10}", key), Style::default().fg(Color::Green)),
            Span::styled(format!("  {}", desc), Style::default().fg(Color::White)),
        ])
    }
}
