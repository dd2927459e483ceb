use ratatui::style::Color;

use crate::calendar::COLOR_POOL_SIZE;

/// A pool color and its dimmed variant for days outside the shown month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventColor {
    pub normal: Color,
    pub translucent: Color,
}

const fn pair(r: u8, g: u8, b: u8) -> EventColor {
    EventColor {
        normal: Color::Rgb(r, g, b),
        translucent: Color::Rgb(r / 2, g / 2, b / 2),
    }
}

pub const PALETTE: [EventColor; COLOR_POOL_SIZE] = [
    pair(30, 255, 0),    // green
    pair(0, 112, 255),   // blue
    pair(163, 53, 238),  // purple
    pair(255, 128, 0),   // orange
    pair(226, 104, 168), // pink
    pair(229, 204, 128), // gold
    pair(204, 41, 41),   // red
    pair(255, 255, 102), // yellow
];

pub const TODAY: Color = Color::Rgb(255, 128, 0);
pub const GRID: Color = Color::DarkGray;

pub fn event_color(color_index: usize) -> EventColor {
    PALETTE[color_index % PALETTE.len()]
}

pub fn pick(color: EventColor, in_month: bool) -> Color {
    if in_month {
        color.normal
    } else {
        color.translucent
    }
}
