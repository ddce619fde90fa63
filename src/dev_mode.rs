/// Development mode: replay captured responses
///
/// When the live services are unreachable (or to reproduce a layout change
/// on the forecast page), point the dashboard at a directory of saved
/// responses instead:
///
/// ```text
/// fixtures/
///   usgs_02011400.json   one IV response per site id
///   forecast.html        the projected-release page
///   lake.json            the lake level chart
/// ```
///
/// Responses go through the same parsers as live data. A missing file
/// behaves like a 404 from the real service.

use crate::ingest::{lake, usace, usgs, GaugeSource};
use crate::model::{FetchError, Observation};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

pub const FORECAST_FIXTURE: &str = "forecast.html";
pub const LAKE_FIXTURE: &str = "lake.json";

/// File name for a site's captured IV response.
pub fn usgs_fixture_name(site_id: &str) -> String {
    format!("usgs_{}.json", site_id)
}

/// `GaugeSource` backed by files in a directory.
pub struct FixtureSource {
    dir: PathBuf,
    forecast_path: Vec<usize>,
}

impl FixtureSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            forecast_path: usace::default_forecast_path(),
        }
    }

    /// Uses a non-default cell path for the forecast page.
    pub fn with_forecast_path(mut self, path: Vec<usize>) -> Self {
        self.forecast_path = path;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read(&self, name: &str) -> Result<String, FetchError> {
        let path = self.dir.join(name);
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FetchError::Http(404)),
            Err(e) => Err(FetchError::Network(format!("{}: {}", path.display(), e))),
        }
    }
}

impl GaugeSource for FixtureSource {
    fn get_observation(&self, site_id: &str) -> Result<Observation, FetchError> {
        let body = self.read(&usgs_fixture_name(site_id))?;
        Ok(usgs::latest_observation(&usgs::parse_iv_response(&body)?))
    }

    fn fetch_forecast_text(&self) -> Result<String, FetchError> {
        let page = self.read(FORECAST_FIXTURE)?;
        usace::extract_forecast_text(&page, &self.forecast_path)
    }

    fn get_reservoir_level(&self, today: NaiveDate) -> Result<Option<f64>, FetchError> {
        let chart = lake::parse_level_chart(&self.read(LAKE_FIXTURE)?)?;
        Ok(lake::latest_level_at(&chart, today))
    }
}
