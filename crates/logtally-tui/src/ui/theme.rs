use ratatui::style::{Color, Modifier, Style};

/// Color theme for the dashboard
pub struct Theme;

impl Theme {
    // Base colors
    pub const BG: Color = Color::Reset;
    pub const FG: Color = Color::White;
    pub const FG_DIM: Color = Color::DarkGray;

    // Accent colors
    pub const PRIMARY: Color = Color::Cyan;
    pub const HIGHLIGHT: Color = Color::Yellow;

    // Status class colors
    pub const SUCCESS: Color = Color::Green;
    pub const REDIRECT: Color = Color::Blue;
    pub const WARNING: Color = Color::Yellow;
    pub const ERROR: Color = Color::Red;

    /// Heatmap intensity ramp, coldest first
    pub const HEAT: [Color; 5] = [
        Color::DarkGray,
        Color::Blue,
        Color::Cyan,
        Color::Yellow,
        Color::Red,
    ];

    // Border styles
    pub fn border() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn border_focused() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    // Text styles
    pub fn title() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn text_dim() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn text_highlight() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    // Tables
    pub fn table_header() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn row_selected() -> Style {
        Style::default()
            .fg(Self::BG)
            .bg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Color for an HTTP status code by class
    pub fn status_code(code: u16) -> Style {
        let color = match code {
            200..=299 => Self::SUCCESS,
            300..=399 => Self::REDIRECT,
            400..=499 => Self::WARNING,
            500..=599 => Self::ERROR,
            _ => Self::FG,
        };
        Style::default().fg(color)
    }

    pub fn bar() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    // Status bar
    pub fn status_bar() -> Style {
        Style::default().fg(Self::FG_DIM).bg(Color::DarkGray)
    }

    pub fn status_bar_key() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }

    // Error
    pub fn error() -> Style {
        Style::default()
            .fg(Self::ERROR)
            .add_modifier(Modifier::BOLD)
    }
}
