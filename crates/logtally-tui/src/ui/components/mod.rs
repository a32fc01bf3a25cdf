mod bar;
mod help_overlay;
mod status_bar;

pub use bar::{bar, bar_cells, heat_level};
pub use help_overlay::HelpOverlay;
pub use status_bar::{StatusBar, dashboard_hints};
