//! Terminal dashboard for logtally
//!
//! This crate provides the full-screen traffic dashboard: panel state,
//! keybindings, terminal event handling and the report panels.

pub mod app;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{Action, AppState, Panel};
pub use config::{KeyBinding, KeyBindings, KeyContext};
pub use tui::{Event, EventHandler, Tui};
pub use ui::components::{HelpOverlay, StatusBar, bar, dashboard_hints, heat_level};
pub use ui::screens::{
    DailyPanel, DashboardScreen, ErrorsPanel, HeatmapPanel, OverviewPanel, ResourcesPanel,
    TopIpsPanel,
};
pub use ui::{Layout, Theme};
