use crate::app::Panel;

/// All possible actions in the dashboard (command pattern)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    // Navigation
    NextPanel,
    PrevPanel,
    SelectPanel(Panel),
    Quit,

    // Table rows
    RowUp,
    RowDown,
    RowTop,

    // UI toggles
    ToggleHelp,

    // Data
    Refresh,
    MoreRows,
    FewerRows,

    // Render request
    Render,
}
