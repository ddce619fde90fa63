/// Lake Moomaw level feed (lakesonline.com chart data).
///
/// The feed is a sparse calendar: `charts[i]` holds the readings for
/// day-of-year `i` (0 = Jan 1), keyed by calendar year.
///
/// ```json
/// { "charts": [ { "2023": 1581.2, "2024": 1579.9 }, { "2023": 1581.1 }, ... ] }
/// ```

use crate::model::{finite_reading, FetchError};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::collections::HashMap;

pub const LAKE_URL: &str = "https://moomaw.lakesonline.com/LevelDataJSON.asp?SiteID=VA006";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LevelChart {
    pub charts: Vec<Option<HashMap<String, serde_json::Value>>>,
}

impl LevelChart {
    /// Level recorded on day `index` of `year`, if any.
    ///
    /// Readings may be JSON numbers or numeric strings; anything else,
    /// including "NaN", counts as no reading.
    pub fn level_at(&self, index: usize, year: i32) -> Option<f64> {
        let day = self.charts.get(index)?.as_ref()?;
        finite_reading(day.get(&year.to_string())?)
    }
}

pub fn parse_level_chart(body: &str) -> Result<LevelChart, FetchError> {
    Ok(serde_json::from_str(body)?)
}

/// 0-based day-of-year index: Jan 1 is 0, Dec 31 is 364 or 365.
pub fn day_index(date: NaiveDate) -> usize {
    date.ordinal0() as usize
}

/// Most recent level on or before `today` within `today`'s year.
///
/// Walks back one day at a time from today's index to Jan 1. The walk does
/// not continue into the previous year, so in early January this returns
/// `None` until the first reading of the new year is posted.
pub fn latest_level_at(chart: &LevelChart, today: NaiveDate) -> Option<f64> {
    let year = today.year();
    (0..=day_index(today))
        .rev()
        .find_map(|index| chart.level_at(index, year))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// A 366-day chart with readings for `year` on the given day indices.
    fn chart_with(year: i32, days: &[(usize, f64)]) -> LevelChart {
        let mut charts = vec![Some(HashMap::new()); 366];
        for &(index, level) in days {
            if let Some(day) = charts[index].as_mut() {
                day.insert(year.to_string(), json!(level));
            }
        }
        LevelChart { charts }
    }

    #[test]
    fn test_day_index_is_zero_based() {
        assert_eq!(day_index(date(2024, 1, 1)), 0);
        assert_eq!(day_index(date(2024, 2, 1)), 31);
        assert_eq!(day_index(date(2024, 12, 31)), 365); // leap year
        assert_eq!(day_index(date(2025, 12, 31)), 364);
    }

    #[test]
    fn test_reading_today_is_returned() {
        let today = date(2024, 5, 30);
        let chart = chart_with(2024, &[(day_index(today), 1581.7)]);
        assert_eq!(latest_level_at(&chart, today), Some(1581.7));
    }

    #[test]
    fn test_walks_back_over_missing_days() {
        // Day 150 and 149 missing, day 148 present.
        let today = date(2024, 5, 30);
        assert_eq!(day_index(today), 150);
        let chart = chart_with(2024, &[(148, 1580.02), (100, 1575.0)]);
        assert_eq!(latest_level_at(&chart, today), Some(1580.02));
    }

    #[test]
    fn test_other_years_are_ignored() {
        let today = date(2024, 5, 30);
        let chart = chart_with(2023, &[(150, 1590.0)]);
        assert_eq!(latest_level_at(&chart, today), None);
    }

    #[test]
    fn test_no_rollover_into_previous_year() {
        // Readings exist for late December 2023 but nothing yet in 2024.
        let chart = chart_with(2023, &[(364, 1583.0)]);
        assert_eq!(latest_level_at(&chart, date(2024, 1, 2)), None);
    }

    #[test]
    fn test_jan_first_reads_index_zero() {
        let chart = chart_with(2024, &[(0, 1582.5)]);
        assert_eq!(latest_level_at(&chart, date(2024, 1, 1)), Some(1582.5));
    }

    #[test]
    fn test_empty_chart_is_none() {
        assert_eq!(latest_level_at(&LevelChart::default(), date(2024, 6, 1)), None);
    }

    #[test]
    fn test_short_chart_skips_missing_indices() {
        let chart = chart_with(2024, &[(3, 1579.0)]);
        let short = LevelChart { charts: chart.charts[..10].to_vec() };
        assert_eq!(latest_level_at(&short, date(2024, 6, 1)), Some(1579.0));
    }

    #[test]
    fn test_parse_accepts_numbers_strings_and_nulls() {
        let body = r#"{"charts":[{"2024":"1581.40"},{"2024":null},null,{"2024":1581.2,"2023":1577}]}"#;
        let chart = parse_level_chart(body).expect("valid chart");
        assert_eq!(chart.level_at(0, 2024), Some(1581.4));
        assert_eq!(chart.level_at(1, 2024), None);
        assert_eq!(chart.level_at(2, 2024), None);
        assert_eq!(chart.level_at(3, 2023), Some(1577.0));
        // Index 2 is empty and index 1 is null, so Jan 3 walks back to Jan 1.
        assert_eq!(latest_level_at(&chart, date(2024, 1, 3)), Some(1581.4));
        assert_eq!(latest_level_at(&chart, date(2024, 1, 4)), Some(1581.2));
    }

    #[test]
    fn test_non_finite_level_walks_back() {
        let chart = parse_level_chart(r#"{"charts":[{"2024":1580.9},{"2024":"NaN"},{"2024":"inf"}]}"#).unwrap();
        assert_eq!(chart.level_at(1, 2024), None);
        assert_eq!(latest_level_at(&chart, date(2024, 1, 3)), Some(1580.9));
    }

    #[test]
    fn test_missing_charts_key_is_parse_error() {
        let err = parse_level_chart(r#"{"levels":[]}"#).unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }
}
