//! Color choices for the terminal user interface.

use ratatui::style::Color;

use hrdesk::fields::{Priority, Status};

pub const GOLD: Color = Color::Rgb(255, 215, 0);
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
pub const DARK_PURPLE: Color = Color::Rgb(86, 60, 92);

/// Accent used for the header and status bar.
pub const ACCENT: Color = DARK_PURPLE;

pub fn status_color(status: Status) -> Color {
    match status {
        Status::Open => Color::White,
        Status::Working => GOLD,
        Status::Pending | Status::Review => Color::Cyan,
        Status::Overdue => Color::LightRed,
        Status::Completed => Color::Green,
        Status::Canceled | Status::Transferred => Color::DarkGray,
    }
}

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::LightRed,
        Priority::Medium => GOLD,
        Priority::Low => Color::Gray,
    }
}
