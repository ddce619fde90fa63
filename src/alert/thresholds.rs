//! Flow / gage-height threshold classification.
//!
//! Each site may define one ascending list of breakpoints, for either flow
//! or gage height. Breakpoint `i` separates palette color `i` from `i + 1`,
//! so a table always has one more color than it has breakpoints.

use super::Color;
use serde::Deserialize;

/// Shared palette for flow and height tables, lowest severity first.
pub const FLOW_COLORS: [Color; 5] = [
    Color::DarkRed,
    Color::Green,
    Color::DarkOrange,
    Color::Red,
    Color::Magenta,
];

/// Which reading a site's breakpoints apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Flow,
    Height,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Thresholds {
    pub metric: Metric,
    pub breakpoints: Vec<f64>,
}

impl Thresholds {
    pub fn flow(breakpoints: &[f64]) -> Self {
        Self { metric: Metric::Flow, breakpoints: breakpoints.to_vec() }
    }

    pub fn height(breakpoints: &[f64]) -> Self {
        Self { metric: Metric::Height, breakpoints: breakpoints.to_vec() }
    }

    /// Checks the palette correspondence and ascending order.
    pub fn validate(&self) -> Result<(), String> {
        if self.breakpoints.len() + 1 != FLOW_COLORS.len() {
            return Err(format!(
                "expected {} breakpoints for a {}-color palette, got {}",
                FLOW_COLORS.len() - 1,
                FLOW_COLORS.len(),
                self.breakpoints.len()
            ));
        }
        if self.breakpoints.iter().any(|b| !b.is_finite()) {
            return Err("breakpoints must be finite".to_string());
        }
        if self.breakpoints.windows(2).any(|w| w[0] >= w[1]) {
            return Err(format!("breakpoints must be strictly ascending: {:?}", self.breakpoints));
        }
        Ok(())
    }

    /// Color for `value`: the first breakpoint strictly above it picks the
    /// color at its index, otherwise the highest-severity color.
    pub fn color_for(&self, value: f64) -> Color {
        self.breakpoints
            .iter()
            .position(|&t| value < t)
            .map(|i| FLOW_COLORS[i])
            .unwrap_or(FLOW_COLORS[FLOW_COLORS.len() - 1])
    }
}

/// Combined flow/height color for a site.
///
/// Returns `None` when the site has no table or the table's reading is
/// absent; the display then stays neutral.
pub fn classify_by_threshold(
    thresholds: Option<&Thresholds>,
    flow: Option<f64>,
    height: Option<f64>,
) -> Option<Color> {
    let thresholds = thresholds?;
    let value = match thresholds.metric {
        Metric::Flow => flow?,
        Metric::Height => height?,
    };
    Some(thresholds.color_for(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bacova() -> Thresholds {
        Thresholds::flow(&[100.0, 300.0, 500.0, 800.0])
    }

    #[test]
    fn test_value_below_first_breakpoint_gets_first_color() {
        assert_eq!(classify_by_threshold(Some(&bacova()), Some(42.0), None), Some(Color::DarkRed));
    }

    #[test]
    fn test_breakpoint_value_moves_to_next_color() {
        // Comparison is strict: 100 is not < 100.
        assert_eq!(bacova().color_for(100.0), Color::Green);
        assert_eq!(bacova().color_for(299.9), Color::Green);
        assert_eq!(bacova().color_for(300.0), Color::DarkOrange);
        assert_eq!(bacova().color_for(799.0), Color::Red);
    }

    #[test]
    fn test_value_above_every_breakpoint_gets_last_color() {
        assert_eq!(bacova().color_for(800.0), Color::Magenta);
        assert_eq!(bacova().color_for(12_000.0), Color::Magenta);
    }

    #[test]
    fn test_height_table_uses_height_and_ignores_flow() {
        let falling_spring = Thresholds::height(&[4.0, 7.0, 9.0, 10.0]);
        assert_eq!(
            classify_by_threshold(Some(&falling_spring), Some(5_000.0), Some(5.2)),
            Some(Color::Green)
        );
        assert_eq!(
            classify_by_threshold(Some(&falling_spring), None, Some(11.0)),
            Some(Color::Magenta)
        );
    }

    #[test]
    fn test_missing_reading_or_table_is_unclassified() {
        assert_eq!(classify_by_threshold(Some(&bacova()), None, Some(3.0)), None);
        assert_eq!(classify_by_threshold(None, Some(250.0), Some(3.0)), None);
    }

    #[test]
    fn test_validate_accepts_registry_shape() {
        assert!(bacova().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_wrong_length() {
        let short = Thresholds::flow(&[100.0, 300.0, 500.0]);
        let err = short.validate().unwrap_err();
        assert!(err.contains("expected 4 breakpoints"), "got: {}", err);
    }

    #[test]
    fn test_validate_rejects_unordered_breakpoints() {
        let unordered = Thresholds::flow(&[100.0, 800.0, 500.0, 1000.0]);
        assert!(unordered.validate().is_err());
        let repeated = Thresholds::flow(&[100.0, 100.0, 500.0, 1000.0]);
        assert!(repeated.validate().is_err());
    }
}
