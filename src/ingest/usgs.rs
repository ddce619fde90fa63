/// USGS NWIS Instantaneous Values client.
///
/// Builds IV request URLs and reduces the JSON response to the latest
/// flow, gage height, and water temperature for a single site.
///
/// API documentation: https://waterservices.usgs.gov/docs/instantaneous-values/

use crate::model::{
    celsius_to_fahrenheit, finite_reading, round_half_up, FetchError, Observation, SiteSeries,
    SourceInfo, NO_DATA_SENTINEL, PARAM_DISCHARGE, PARAM_STAGE, PARAM_WATER_TEMP,
};
use serde::Deserialize;

pub const IV_BASE_URL: &str = "https://waterservices.usgs.gov/nwis/iv/";

/// Substrings of `variable.variableName` that identify each series.
pub const FLOW_VAR_NAME: &str = "Streamflow";
pub const HEIGHT_VAR_NAME: &str = "Gage height";
pub const TEMP_VAR_NAME: &str = "Temperature, water";

// ============================================================================
// IV API Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct IvResponse {
    value: IvValue,
}

#[derive(Debug, Deserialize)]
struct IvValue {
    #[serde(rename = "timeSeries")]
    time_series: Vec<IvTimeSeries>,
}

#[derive(Debug, Deserialize)]
struct IvTimeSeries {
    variable: IvVariable,
    #[serde(default)]
    values: Vec<IvValueSet>,
    #[serde(rename = "sourceInfo")]
    source_info: Option<IvSourceInfo>,
}

#[derive(Debug, Deserialize)]
struct IvVariable {
    #[serde(rename = "variableName")]
    variable_name: String,
}

#[derive(Debug, Deserialize)]
struct IvValueSet {
    #[serde(default)]
    value: Vec<IvPoint>,
}

#[derive(Debug, Deserialize)]
struct IvPoint {
    value: serde_json::Value, // USGS sends readings as strings, e.g. "312"
}

#[derive(Debug, Deserialize)]
struct IvSourceInfo {
    #[serde(rename = "siteName")]
    site_name: String,
    #[serde(rename = "geoLocation")]
    geo_location: IvGeoLocation,
}

#[derive(Debug, Deserialize)]
struct IvGeoLocation {
    #[serde(rename = "geogLocation")]
    geog_location: IvGeogLocation,
}

#[derive(Debug, Deserialize)]
struct IvGeogLocation {
    latitude: f64,
    longitude: f64,
}

// ============================================================================
// URL construction
// ============================================================================

/// IV request for flow, gage height and water temperature at one site.
///
/// Without `period_days` the service returns only the latest instant.
pub fn build_iv_url(base_url: &str, site_id: &str, period_days: Option<u32>) -> String {
    let period = period_days
        .map(|days| format!("&period=P{}D", days))
        .unwrap_or_default();
    format!(
        "{}?format=json&sites={}{}&parameterCd={},{},{}",
        base_url, site_id, period, PARAM_DISCHARGE, PARAM_STAGE, PARAM_WATER_TEMP
    )
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses an IV response body into per-variable value lists.
///
/// For each variable the first series whose name contains the variable's
/// substring is used; a variable with no matching series is an empty list.
/// Sentinel readings and readings that are not finite numbers (equipment
/// codes like "Eqp", "NaN") are dropped, so one bad reading never hides the
/// rest of the site. A body without `value.timeSeries` is a parse error.
pub fn parse_iv_response(body: &str) -> Result<SiteSeries, FetchError> {
    let response: IvResponse = serde_json::from_str(body)?;
    let series = &response.value.time_series;

    let mut out = SiteSeries::default();
    for (var_name, values) in [
        (FLOW_VAR_NAME, &mut out.flow_cfs),
        (HEIGHT_VAR_NAME, &mut out.height_ft),
        (TEMP_VAR_NAME, &mut out.temp_c),
    ] {
        let Some(ts) = series.iter().find(|ts| ts.variable.variable_name.contains(var_name)) else {
            continue;
        };
        *values = series_values(ts);
        // Later variables override earlier ones, so temperature's info wins.
        if let Some(info) = &ts.source_info {
            out.source = Some(SourceInfo {
                site_name: info.site_name.clone(),
                latitude: info.geo_location.geog_location.latitude,
                longitude: info.geo_location.geog_location.longitude,
            });
        }
    }
    Ok(out)
}

fn series_values(ts: &IvTimeSeries) -> Vec<f64> {
    let Some(set) = ts.values.first() else {
        return Vec::new();
    };
    set.value
        .iter()
        .filter_map(|point| finite_reading(&point.value))
        .filter(|&v| v != NO_DATA_SENTINEL)
        .collect()
}

/// Reduces value lists to the latest reading of each variable.
///
/// Flow is rounded to 0.1 cfs, height to 0.01 ft; temperature is converted
/// from °C to °F and rounded to 0.01.
pub fn latest_observation(series: &SiteSeries) -> Observation {
    Observation {
        flow: series.flow_cfs.last().map(|&v| round_half_up(v, 1)),
        height: series.height_ft.last().map(|&v| round_half_up(v, 2)),
        temperature: series
            .temp_c
            .last()
            .map(|&c| round_half_up(celsius_to_fahrenheit(c), 2)),
        source: series.source.clone(),
    }
}

// ============================================================================
// Tests
// ============================================================================
