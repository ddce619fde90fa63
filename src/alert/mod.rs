//! Color classification for gauge values.
//!
//! Every classifier maps an optional value onto a named display color.
//! `Color::Gray` is the neutral color used when there is nothing to classify.

pub mod reservoir;
pub mod temperature;
pub mod thresholds;

use std::fmt;

/// Named CSS colors used by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Gray,
    Blue,
    Green,
    DarkGreen,
    DarkOrange,
    Red,
    DarkRed,
    Magenta,
}

impl Color {
    pub fn css_name(self) -> &'static str {
        match self {
            Color::Gray => "gray",
            Color::Blue => "blue",
            Color::Green => "green",
            Color::DarkGreen => "darkgreen",
            Color::DarkOrange => "darkorange",
            Color::Red => "red",
            Color::DarkRed => "darkred",
            Color::Magenta => "magenta",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_name())
    }
}
