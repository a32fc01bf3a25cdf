use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

/// Layout helper for consistent screen layouts
pub struct Layout;

impl Layout {
    /// Create the main layout with header, content, and status bar
    pub fn main(area: Rect) -> (Rect, Rect, Rect) {
        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Tabs
                Constraint::Min(1),    // Panel
                Constraint::Length(1), // Status bar
            ])
            .split(area);

        (chunks[0], chunks[1], chunks[2])
    }

    /// Overview panel: stats on top, hourly chart and status table below
    pub fn overview(area: Rect) -> (Rect, Rect, Rect) {
        let rows = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(8), Constraint::Min(6)])
            .split(area);

        let bottom = RatatuiLayout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(rows[1]);

        (rows[0], bottom[0], bottom[1])
    }

    /// A centered popup of at most `width` x `height` cells
    pub fn popup(area: Rect, width: u16, height: u16) -> Rect {
        let width = width.min(area.width.saturating_sub(4));
        let height = height.min(area.height.saturating_sub(4));

        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        Rect::new(x, y, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_layout_reserves_chrome() {
        let (header, content, status) = Layout::main(Rect::new(0, 0, 80, 24));
        assert_eq!(header.height, 3);
        assert_eq!(status.height, 1);
        assert_eq!(content.height, 20);
    }

    #[test]
    fn test_popup_fits_small_terminal() {
        let area = Rect::new(0, 0, 30, 10);
        let popup = Layout::popup(area, 50, 24);
        assert_eq!((popup.width, popup.height), (26, 6));
        assert_eq!((popup.x, popup.y), (2, 2));
    }
}
