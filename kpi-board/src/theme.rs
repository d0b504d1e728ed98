//! Kanagawa Dragon theme module.
//!
//! Base palette for the chrome plus the two KPI-specific palettes: one color
//! per global KPI and a red-to-green semaphore for achievement levels.

use kpi_board::board::PALETTE_SIZE;
use ratatui::style::Color;

/// Kanagawa Dragon color palette
pub mod colors {
    use super::Color;

    // === Background Colors ===
    /// Dragon Black - Primary background
    pub const BG_DARK: Color = Color::Rgb(0x18, 0x16, 0x16);
    /// Slightly lighter background for panels and cards
    pub const BG_MEDIUM: Color = Color::Rgb(0x1D, 0x1C, 0x19);
    /// Background for the selected card or row
    pub const BG_HIGHLIGHT: Color = Color::Rgb(0x28, 0x27, 0x27);

    // === Foreground Colors ===
    /// Old White - Primary text color
    pub const FG_PRIMARY: Color = Color::Rgb(0xC5, 0xC9, 0xC5);
    /// Dimmed text for secondary information
    pub const FG_DIM: Color = Color::Rgb(0x72, 0x71, 0x69);
    /// Very dim text for hints and placeholders
    pub const FG_HINT: Color = Color::Rgb(0x54, 0x54, 0x54);

    // === Accent Colors ===
    pub const RED: Color = Color::Rgb(0xC4, 0x74, 0x6E);
    pub const GREEN: Color = Color::Rgb(0x8A, 0x9A, 0x7B);
    pub const YELLOW: Color = Color::Rgb(0xC4, 0xB2, 0x8A);
    pub const BLUE: Color = Color::Rgb(0x8B, 0xA4, 0xB0);
    pub const PURPLE: Color = Color::Rgb(0x95, 0x7F, 0xB8);

    // === UI Element Colors ===
    /// Wall Gray - For borders and separators
    pub const BORDER: Color = Color::Rgb(0x72, 0x71, 0x69);
    /// Dim border for less important separators
    pub const BORDER_DIM: Color = Color::Rgb(0x3A, 0x3A, 0x3A);
    /// Accent border for focused elements
    pub const BORDER_ACCENT: Color = Color::Rgb(0x8B, 0xA4, 0xB0);

    // === Status Colors ===
    pub const STATUS_SYNCED: Color = GREEN;
    pub const STATUS_PENDING: Color = YELLOW;

    /// Ladder cell that has not been reached
    pub const LEVEL_INACTIVE: Color = Color::Rgb(0x3A, 0x3A, 0x3A);
}

/// One color per global KPI, assigned by color slot
pub const KPI_COLORS: [Color; PALETTE_SIZE] = [
    Color::Rgb(0x0E, 0xA5, 0xE9), // sky
    Color::Rgb(0x10, 0xB9, 0x81), // emerald
    Color::Rgb(0xF5, 0x9E, 0x0B), // amber
    Color::Rgb(0x63, 0x66, 0xF1), // indigo
    Color::Rgb(0xF4, 0x3F, 0x5E), // rose
    Color::Rgb(0x06, 0xB6, 0xD4), // cyan
    Color::Rgb(0x8B, 0x5C, 0xF6), // violet
];

/// Semaphore for levels 1..=5
pub const LEVEL_COLORS: [Color; 5] = [
    Color::Rgb(0xE1, 0x1D, 0x48), // rose
    Color::Rgb(0xD9, 0x77, 0x06), // amber
    Color::Rgb(0x65, 0xA3, 0x0D), // lime
    Color::Rgb(0x16, 0xA3, 0x4A), // green
    Color::Rgb(0x05, 0x96, 0x69), // emerald
];

/// Get a global KPI color by slot (cycles through available colors)
pub fn kpi_color(slot: usize) -> Color {
    KPI_COLORS[slot % KPI_COLORS.len()]
}

/// Color for an achievement level; level 0 has no semaphore color
pub fn level_color(level: u8) -> Option<Color> {
    match level {
        1..=5 => Some(LEVEL_COLORS[level as usize - 1]),
        _ => None,
    }
}

/// Semantic styling helpers
pub mod styles {
    use ratatui::style::{Modifier, Style};

    use super::colors;

    /// Style for primary text
    pub fn text() -> Style {
        Style::default().fg(colors::FG_PRIMARY)
    }

    /// Style for dimmed/secondary text
    pub fn text_dim() -> Style {
        Style::default().fg(colors::FG_DIM)
    }

    /// Style for hint text
    pub fn text_hint() -> Style {
        Style::default().fg(colors::FG_HINT)
    }

    pub fn success() -> Style {
        Style::default().fg(colors::GREEN)
    }

    pub fn error() -> Style {
        Style::default().fg(colors::RED)
    }

    pub fn warning() -> Style {
        Style::default().fg(colors::YELLOW)
    }

    pub fn info() -> Style {
        Style::default().fg(colors::BLUE)
    }

    /// Style for focused borders
    pub fn border_focused() -> Style {
        Style::default().fg(colors::BORDER_ACCENT)
    }

    /// Style for unfocused borders
    pub fn border() -> Style {
        Style::default().fg(colors::BORDER)
    }

    pub fn border_dim() -> Style {
        Style::default().fg(colors::BORDER_DIM)
    }

    /// Style for block titles
    pub fn title() -> Style {
        Style::default()
            .fg(colors::FG_PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for accent titles (tabs, headers)
    pub fn title_accent() -> Style {
        Style::default()
            .fg(colors::BLUE)
            .add_modifier(Modifier::BOLD)
    }

    pub fn tab_active() -> Style {
        Style::default()
            .fg(colors::BLUE)
            .add_modifier(Modifier::BOLD)
    }

    pub fn tab_inactive() -> Style {
        Style::default().fg(colors::FG_DIM)
    }

    /// Style for field labels inside cards
    pub fn label() -> Style {
        Style::default()
            .fg(colors::FG_DIM)
            .add_modifier(Modifier::BOLD)
    }
}
