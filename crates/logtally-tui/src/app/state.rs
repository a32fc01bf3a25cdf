use chrono::{DateTime, Local};
use ratatui::widgets::TableState;

use logtally_analytics::DashboardSnapshot;

use super::Action;

/// Bounds and step of the ranked-row count
pub const TOP_N_MIN: usize = 5;
pub const TOP_N_MAX: usize = 50;
pub const TOP_N_STEP: usize = 5;

/// Dashboard panels in tab order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Panel {
    Overview,
    TopIps,
    Resources,
    Errors,
    Heatmap,
    Daily,
}

impl Panel {
    pub const ALL: [Panel; 6] = [
        Panel::Overview,
        Panel::TopIps,
        Panel::Resources,
        Panel::Errors,
        Panel::Heatmap,
        Panel::Daily,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Panel::Overview => "Overview",
            Panel::TopIps => "Top IPs",
            Panel::Resources => "Resources",
            Panel::Errors => "Errors",
            Panel::Heatmap => "Heatmap",
            Panel::Daily => "Daily",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    /// Panel for a zero-based tab index
    pub fn from_index(index: usize) -> Option<Panel> {
        Self::ALL.get(index).copied()
    }

    pub fn next(self) -> Panel {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Panel {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Global dashboard state
pub struct AppState {
    /// Panel currently displayed
    pub panel: Panel,

    /// Latest computed reports (None until the first refresh lands)
    pub snapshot: Option<DashboardSnapshot>,

    /// A refresh is running in the background
    pub refreshing: bool,

    /// Settings changed mid-refresh; refresh again once it lands
    pub refresh_queued: bool,

    /// When the current snapshot was received
    pub last_refresh: Option<DateTime<Local>>,

    /// Is help overlay visible?
    pub help_visible: bool,

    /// Error message to display (if any)
    pub error_message: Option<String>,

    /// Row selection for table panels
    pub table_state: TableState,

    /// Whether app should quit
    pub should_quit: bool,

    /// Ranked rows requested per report
    pub top_n: usize,

    /// Daily traffic window
    pub days: u32,
}

impl AppState {
    pub fn new(top_n: usize, days: u32) -> Self {
        Self {
            panel: Panel::Overview,
            snapshot: None,
            refreshing: false,
            refresh_queued: false,
            last_refresh: None,
            help_visible: false,
            error_message: None,
            table_state: TableState::default(),
            should_quit: false,
            top_n,
            days,
        }
    }

    /// Apply an action. Returns true when the caller should start a refresh.
    pub fn apply(&mut self, action: Action) -> bool {
        match action {
            Action::NextPanel => self.select_panel(self.panel.next()),
            Action::PrevPanel => self.select_panel(self.panel.prev()),
            Action::SelectPanel(panel) => self.select_panel(panel),
            Action::Quit => self.should_quit = true,
            Action::RowUp => self.row_up(),
            Action::RowDown => self.row_down(),
            Action::RowTop => {
                let first = self.first_row();
                self.table_state.select(first);
            }
            Action::ToggleHelp => self.help_visible = !self.help_visible,
            Action::Refresh => {
                if !self.refreshing {
                    self.refreshing = true;
                    return true;
                }
            }
            Action::MoreRows => {
                let n = (self.top_n / TOP_N_STEP + 1) * TOP_N_STEP;
                return self.set_top_n(n);
            }
            Action::FewerRows => {
                let n = self.top_n.saturating_sub(1) / TOP_N_STEP * TOP_N_STEP;
                return self.set_top_n(n);
            }
            Action::Render => {}
        }
        false
    }

    /// Change the ranked-row count, clamped to the allowed range. Returns
    /// true when a refresh should start now.
    fn set_top_n(&mut self, n: usize) -> bool {
        let n = n.clamp(TOP_N_MIN, TOP_N_MAX);
        if n == self.top_n {
            return false;
        }
        self.top_n = n;
        if self.refreshing {
            self.refresh_queued = true;
            return false;
        }
        self.refreshing = true;
        true
    }

    /// Settle the running refresh. Returns true when a queued one should
    /// start, in which case `refreshing` stays set.
    fn refresh_done(&mut self) -> bool {
        if std::mem::take(&mut self.refresh_queued) {
            return true;
        }
        self.refreshing = false;
        false
    }

    /// Switch panels, resetting the row selection
    pub fn select_panel(&mut self, panel: Panel) {
        self.panel = panel;
        let first = self.first_row();
        self.table_state.select(first);
    }

    /// Install a freshly computed snapshot. Returns true when the caller
    /// should start another refresh.
    pub fn set_snapshot(&mut self, snapshot: DashboardSnapshot) -> bool {
        let again = self.refresh_done();
        self.last_refresh = Some(Local::now());
        self.error_message = if snapshot.failures.is_empty() {
            None
        } else {
            Some(snapshot.failures.join("; "))
        };
        self.snapshot = Some(snapshot);

        // Keep the selection inside the new row count
        let len = self.current_rows_len();
        match self.table_state.selected() {
            Some(i) if i >= len => self.table_state.select(len.checked_sub(1)),
            None if len > 0 => self.table_state.select(Some(0)),
            _ => {}
        }
        again
    }

    /// A refresh could not complete. Returns true when the caller should
    /// start another refresh.
    pub fn refresh_failed(&mut self, msg: String) -> bool {
        self.show_error(msg);
        self.refresh_done()
    }

    /// Rows in the table shown by the current panel
    pub fn current_rows_len(&self) -> usize {
        let Some(snapshot) = &self.snapshot else {
            return 0;
        };
        match self.panel {
            Panel::TopIps => snapshot.top_ips.len(),
            Panel::Resources => snapshot.resources.len(),
            Panel::Errors => snapshot.errors.len(),
            Panel::Daily => snapshot.daily.len(),
            Panel::Overview | Panel::Heatmap => 0,
        }
    }

    fn first_row(&self) -> Option<usize> {
        (self.current_rows_len() > 0).then_some(0)
    }

    /// Move selection up, wrapping to the last row
    pub fn row_up(&mut self) {
        let len = self.current_rows_len();
        if len == 0 {
            return;
        }

        let i = match self.table_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }

    /// Move selection down, wrapping to the first row
    pub fn row_down(&mut self) {
        let len = self.current_rows_len();
        if len == 0 {
            return;
        }

        let i = match self.table_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(i));
    }

    /// Show an error message
    pub fn show_error(&mut self, msg: String) {
        self.error_message = Some(msg);
    }
}
