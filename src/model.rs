/// Core data types for the Jackson River dashboard.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O: observations, source metadata, rounding helpers and
/// the fetch error type.

// ---------------------------------------------------------------------------
// Parameter codes
// ---------------------------------------------------------------------------

/// USGS parameter code for discharge (streamflow), in cubic feet per second.
pub const PARAM_DISCHARGE: &str = "00060";

/// USGS parameter code for gage height (stage), in feet.
pub const PARAM_STAGE: &str = "00065";

/// USGS parameter code for water temperature, in degrees Celsius.
pub const PARAM_WATER_TEMP: &str = "00010";

/// USGS reports this value when a sensor has no reading.
pub const NO_DATA_SENTINEL: f64 = -999_999.0;

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// Site metadata that accompanies a USGS time series.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInfo {
    pub site_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// The three value lists requested for a site, oldest first.
///
/// A variable that was not present in the response is an empty list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteSeries {
    pub source: Option<SourceInfo>,
    pub flow_cfs: Vec<f64>,
    pub height_ft: Vec<f64>,
    pub temp_c: Vec<f64>,
}

/// Latest values for one site, already rounded and converted to display units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observation {
    pub flow: Option<f64>,        // cfs, 0.1
    pub height: Option<f64>,      // ft, 0.01
    pub temperature: Option<f64>, // °F, 0.01
    pub source: Option<SourceInfo>,
}

impl Observation {
    /// True when none of the three values is present.
    pub fn is_empty(&self) -> bool {
        self.flow.is_none() && self.height.is_none() && self.temperature.is_none()
    }
}

// ---------------------------------------------------------------------------
// Rounding and unit conversion
// ---------------------------------------------------------------------------

/// Rounds half up to `decimals` places: 123.45 -> 123.5, -0.05 -> 0.0.
pub fn round_half_up(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale + 0.5).floor() / scale
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// A reading sent either as a JSON number or a numeric string.
///
/// Text that is not a number ("Ice", "Eqp") and non-finite values such as
/// "NaN" or "inf" are treated as no reading.
pub fn finite_reading(value: &serde_json::Value) -> Option<f64> {
    let v = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    v.is_finite().then_some(v)
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching or decoding a remote data source.
///
/// A missing variable or missing day is not an error: it is represented as
/// an absent value by the parsers.
#[derive(Debug, PartialEq)]
pub enum FetchError {
    /// Transport failure (DNS, connect, timeout, body read).
    Network(String),
    /// Non-2xx HTTP response.
    Http(u16),
    /// The response body did not have the expected shape.
    Parse(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Network(msg) => write!(f, "Network error: {}", msg),
            FetchError::Http(code) => write!(f, "HTTP error: {}", code),
            FetchError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => FetchError::Http(status.as_u16()),
            None if err.is_decode() => FetchError::Parse(err.to_string()),
            None => FetchError::Network(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}
