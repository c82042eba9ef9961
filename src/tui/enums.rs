//! Enumerations for TUI state management.

/// Application state for the terminal user interface.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum AppState {
    TaskList,
    TaskDetail,
    Help,
    Confirm,
}

/// Input mode for the search field.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum InputMode {
    None,
    Search,
}
