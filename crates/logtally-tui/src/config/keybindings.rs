use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::app::{Action, Panel};

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    Dashboard,
    Help,
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, Action>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        // Global bindings
        let mut global = HashMap::new();
        global.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        global.insert(KeyBinding::new(KeyCode::Esc), Action::Quit);
        global.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        global.insert(KeyBinding::new(KeyCode::Char('q')), Action::Quit);
        bindings.insert(KeyContext::Global, global);

        // Dashboard bindings
        let mut dashboard = HashMap::new();
        // Panel navigation
        dashboard.insert(KeyBinding::new(KeyCode::Tab), Action::NextPanel);
        dashboard.insert(KeyBinding::new(KeyCode::Char('l')), Action::NextPanel);
        dashboard.insert(KeyBinding::new(KeyCode::Right), Action::NextPanel);
        // crossterm reports Shift+Tab as BackTab, with or without the modifier
        dashboard.insert(KeyBinding::new(KeyCode::BackTab), Action::PrevPanel);
        dashboard.insert(KeyBinding::shift(KeyCode::BackTab), Action::PrevPanel);
        dashboard.insert(KeyBinding::new(KeyCode::Char('h')), Action::PrevPanel);
        dashboard.insert(KeyBinding::new(KeyCode::Left), Action::PrevPanel);
        for (i, panel) in Panel::ALL.iter().enumerate() {
            if let Some(digit) = char::from_digit(i as u32 + 1, 10) {
                dashboard.insert(
                    KeyBinding::new(KeyCode::Char(digit)),
                    Action::SelectPanel(*panel),
                );
            }
        }
        // Row navigation
        dashboard.insert(KeyBinding::new(KeyCode::Char('j')), Action::RowDown);
        dashboard.insert(KeyBinding::new(KeyCode::Down), Action::RowDown);
        dashboard.insert(KeyBinding::new(KeyCode::Char('k')), Action::RowUp);
        dashboard.insert(KeyBinding::new(KeyCode::Up), Action::RowUp);
        dashboard.insert(KeyBinding::new(KeyCode::Char('g')), Action::RowTop);
        dashboard.insert(KeyBinding::new(KeyCode::Home), Action::RowTop);
        // Data
        dashboard.insert(KeyBinding::new(KeyCode::Char('r')), Action::Refresh);
        dashboard.insert(KeyBinding::new(KeyCode::Char('+')), Action::MoreRows);
        // '+' arrives with SHIFT on most layouts
        dashboard.insert(KeyBinding::shift(KeyCode::Char('+')), Action::MoreRows);
        dashboard.insert(KeyBinding::new(KeyCode::Char('=')), Action::MoreRows);
        dashboard.insert(KeyBinding::new(KeyCode::Char('-')), Action::FewerRows);
        bindings.insert(KeyContext::Dashboard, dashboard);

        // Help overlay: Esc closes the overlay instead of quitting
        let mut help = HashMap::new();
        help.insert(KeyBinding::new(KeyCode::Esc), Action::ToggleHelp);
        bindings.insert(KeyContext::Help, help);

        Self { bindings }
    }

    /// Look up action for key event in given context
    pub fn get_action(&self, context: KeyContext, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        // First check context-specific bindings
        if let Some(action) = self
            .bindings
            .get(&context)
            .and_then(|context_bindings| context_bindings.get(&binding))
        {
            return Some(action.clone());
        }

        // Fall back to global bindings
        self.bindings
            .get(&KeyContext::Global)?
            .get(&binding)
            .cloned()
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}
