//! Dashboard configuration.
//!
//! Settings are read from a TOML file whose path comes from the
//! `JACKSON_DASHBOARD_CONFIG` environment variable (a `.env` file is loaded
//! first by the binary). Without that variable `./dashboard.toml` is used if
//! present; otherwise the compiled-in defaults apply. Every table and key is
//! optional.
//!
//! ```toml
//! [endpoints]
//! usgs_iv_url = "https://waterservices.usgs.gov/nwis/iv/"
//!
//! [refresh]
//! interval_secs = 900
//! period_days = 1
//!
//! [output]
//! html_path = "/var/www/jackson/index.html"
//!
//! [logging]
//! level = "debug"
//! file = "/var/log/jackson_dashboard.log"
//!
//! [[sites]]
//! name = "At Bacova"
//! kind = "gauge"
//! site_id = "02011400"
//! thresholds = { metric = "flow", breakpoints = [100, 300, 500, 800] }
//! ```

use crate::ingest::{lake, usace, usgs};
use crate::logging::LogLevel;
use crate::sites::{SiteDescriptor, SiteRegistry};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV_VAR: &str = "JACKSON_DASHBOARD_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "./dashboard.toml";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io(String),
    /// The file is not valid TOML or has the wrong shape.
    Toml(String),
    /// The file parsed but a value is out of range or inconsistent.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config read error: {}", msg),
            ConfigError::Toml(msg) => write!(f, "Config parse error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub usgs_iv_url: String,
    pub forecast_url: String,
    pub lake_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            usgs_iv_url: usgs::IV_BASE_URL.to_string(),
            forecast_url: usace::FORECAST_URL.to_string(),
            lake_url: lake::LAKE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Seconds between refresh cycles. USGS gauges report every 15 minutes.
    pub interval_secs: u64,
    /// Look-back window for the USGS request; `None` asks for the latest instant.
    pub period_days: Option<u32>,
    pub request_timeout_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { interval_secs: 900, period_days: None, request_timeout_secs: 30 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Child-element path from `<body>` to the "tomorrow" cell.
    pub cell_path: Vec<usize>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self { cell_path: usace::default_forecast_path() }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub html_path: PathBuf,
    pub title: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            html_path: PathBuf::from("dashboard.html"),
            title: "Jackson River Conditions".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub file: Option<String>,
    pub console_timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: LogLevel::Info, file: None, console_timestamps: false }
    }
}

// ---------------------------------------------------------------------------
// Top level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub endpoints: Endpoints,
    pub refresh: RefreshConfig,
    pub forecast: ForecastConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
    /// Replaces the compiled-in registry when present.
    pub sites: Option<Vec<SiteDescriptor>>,
}

impl DashboardConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: DashboardConfig =
            toml::from_str(text).map_err(|e| ConfigError::Toml(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh.interval_secs == 0 {
            return Err(ConfigError::Invalid("refresh.interval_secs must be positive".into()));
        }
        if self.refresh.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "refresh.request_timeout_secs must be positive".into(),
            ));
        }
        if self.forecast.cell_path.is_empty() {
            return Err(ConfigError::Invalid("forecast.cell_path must not be empty".into()));
        }
        self.registry().map(|_| ())
    }

    /// The site registry: `[[sites]]` from the file, or the compiled-in list.
    pub fn registry(&self) -> Result<SiteRegistry, ConfigError> {
        match &self.sites {
            Some(sites) => SiteRegistry::new(sites.clone()).map_err(ConfigError::Invalid),
            None => Ok(SiteRegistry::default()),
        }
    }
}

/// Loads the configuration named by `JACKSON_DASHBOARD_CONFIG`.
///
/// An explicitly named file must exist; the default path is optional.
pub fn load_config() -> Result<DashboardConfig, ConfigError> {
    match std::env::var(CONFIG_ENV_VAR) {
        Ok(path) => DashboardConfig::from_file(Path::new(&path)),
        Err(_) => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                DashboardConfig::from_file(default_path)
            } else {
                Ok(DashboardConfig::default())
            }
        }
    }
}
