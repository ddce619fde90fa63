//! Lake level classification against the reservoir's management pools.
//!
//! Levels are feet above the reservoir datum. Pools in ascending order:
//!   low < full < high < flood

use super::Color;

pub const LOW_LEVEL_FT: f64 = 1572.0;
pub const FULL_POOL_FT: f64 = 1582.0;
pub const HIGH_LEVEL_FT: f64 = 1587.0;
pub const FLOOD_POOL_FT: f64 = 1610.0;

pub fn classify_reservoir(level_ft: Option<f64>) -> Color {
    match level_ft {
        None => Color::Gray,
        Some(l) if l < LOW_LEVEL_FT => Color::Red,
        Some(l) if l < FULL_POOL_FT => Color::DarkOrange,
        Some(l) if l < HIGH_LEVEL_FT => Color::Green,
        // above the high level but still below flood pool
        Some(l) if l < FLOOD_POOL_FT => Color::DarkGreen,
        Some(_) => Color::DarkRed,
    }
}

/// Deviation from full pool, rounded to the nearest hundred feet.
pub fn full_pool_deviation(level_ft: f64) -> f64 {
    100.0 * crate::model::round_half_up((level_ft - FULL_POOL_FT) / 100.0, 0)
}

/// Suffix shown after the lake level, e.g. `"(at full pool)"`.
pub fn full_pool_suffix(level_ft: f64) -> String {
    let diff = full_pool_deviation(level_ft);
    if diff > 0.0 {
        format!("({} ft above full pool)", diff)
    } else if diff < 0.0 {
        format!("({} ft below full pool)", -diff)
    } else {
        "(at full pool)".to_string()
    }
}
