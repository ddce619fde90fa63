//! Water temperature color ladder, in °F.

use super::Color;

pub const COLD_TEMP_F: f64 = 40.0;
pub const MID_TEMP_F: f64 = 60.0;
pub const WARM_TEMP_F: f64 = 65.0;
pub const HOT_TEMP_F: f64 = 70.0;

/// Classifies a water temperature. Boundaries belong to the warmer bucket.
pub fn classify_temperature(temp_f: Option<f64>) -> Color {
    match temp_f {
        None => Color::Gray,
        Some(t) if t < COLD_TEMP_F => Color::Blue,
        Some(t) if t < MID_TEMP_F => Color::Green,
        Some(t) if t < WARM_TEMP_F => Color::DarkOrange,
        Some(t) if t < HOT_TEMP_F => Color::Red,
        Some(_) => Color::DarkRed,
    }
}
