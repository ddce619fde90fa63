//! Remote data sources.
//!
//! Submodules:
//! - `usgs`: water-data time series (flow, gage height, temperature)
//! - `usace`: dam release forecast scraped from an HTML page
//! - `lake`: reservoir level calendar feed
//! - `html`: element tree used by the forecast scraper
//!
//! `GaugeSource` is the seam between fetching and the dashboard refresher:
//! `HttpGaugeSource` talks to the live services, `dev_mode::FixtureSource`
//! replays captured responses, and tests supply their own stubs.

pub mod html;
pub mod lake;
pub mod usace;
pub mod usgs;

use crate::config::DashboardConfig;
use crate::model::{FetchError, Observation};
use chrono::NaiveDate;
use std::time::Duration;

/// Everything the refresher needs from the outside world.
///
/// Implementations are shared across the per-site worker threads.
pub trait GaugeSource: Sync {
    /// Latest flow / height / temperature for a USGS site.
    fn get_observation(&self, site_id: &str) -> Result<Observation, FetchError>;

    /// Tomorrow's projected dam release, as displayed on the forecast page.
    fn fetch_forecast_text(&self) -> Result<String, FetchError>;

    /// Most recent lake level on or before `today`, if one was reported this year.
    fn get_reservoir_level(&self, today: NaiveDate) -> Result<Option<f64>, FetchError>;
}

/// Live HTTP implementation.
pub struct HttpGaugeSource {
    client: reqwest::blocking::Client,
    usgs_iv_url: String,
    forecast_url: String,
    lake_url: String,
    period_days: Option<u32>,
    forecast_path: Vec<usize>,
}

impl HttpGaugeSource {
    pub fn new(client: reqwest::blocking::Client, config: &DashboardConfig) -> Self {
        Self {
            client,
            usgs_iv_url: config.endpoints.usgs_iv_url.clone(),
            forecast_url: config.endpoints.forecast_url.clone(),
            lake_url: config.endpoints.lake_url.clone(),
            period_days: config.refresh.period_days,
            forecast_path: config.forecast.cell_path.clone(),
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Result<Self, FetchError> {
        Ok(Self::new(build_client(config)?, config))
    }

    fn get_text(&self, url: &str) -> Result<String, FetchError> {
        get_text(&self.client, url)
    }
}

/// Blocking client with the configured request timeout and our user agent.
pub fn build_client(config: &DashboardConfig) -> Result<reqwest::blocking::Client, FetchError> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(config.refresh.request_timeout_secs))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// GET `url` as text; any non-2xx status is `FetchError::Http`.
pub fn get_text(client: &reqwest::blocking::Client, url: &str) -> Result<String, FetchError> {
    let response = client.get(url).send()?;
    if !response.status().is_success() {
        return Err(FetchError::Http(response.status().as_u16()));
    }
    Ok(response.text()?)
}

impl GaugeSource for HttpGaugeSource {
    fn get_observation(&self, site_id: &str) -> Result<Observation, FetchError> {
        let url = usgs::build_iv_url(&self.usgs_iv_url, site_id, self.period_days);
        let body = self.get_text(&url)?;
        let series = usgs::parse_iv_response(&body)?;
        Ok(usgs::latest_observation(&series))
    }

    fn fetch_forecast_text(&self) -> Result<String, FetchError> {
        let page = self.get_text(&self.forecast_url)?;
        usace::extract_forecast_text(&page, &self.forecast_path)
    }

    fn get_reservoir_level(&self, today: NaiveDate) -> Result<Option<f64>, FetchError> {
        let body = self.get_text(&self.lake_url)?;
        let chart = lake::parse_level_chart(&body)?;
        Ok(lake::latest_level_at(&chart, today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::time::Instant;

    /// Serves one connection on a local port with `respond`, returning the URL.
    fn serve_once(respond: impl FnOnce(std::net::TcpStream) + Send + 'static) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        std::thread::spawn(move || {
            if let Ok((stream, _)) = listener.accept() {
                respond(stream);
            }
        });
        url
    }

    fn config_with_timeout(secs: u64) -> DashboardConfig {
        let mut config = DashboardConfig::default();
        config.refresh.request_timeout_secs = secs;
        config
    }

    #[test]
    fn test_client_uses_configured_timeout() {
        // Accepts the connection and never answers.
        let url = serve_once(|stream| {
            std::thread::sleep(Duration::from_secs(5));
            drop(stream);
        });
        let client = build_client(&config_with_timeout(1)).unwrap();

        let started = Instant::now();
        let err = get_text(&client, &url).unwrap_err();
        assert!(matches!(err, FetchError::Network(_)), "got {:?}", err);
        assert!(started.elapsed() < Duration::from_secs(4), "took {:?}", started.elapsed());
    }

    #[test]
    fn test_non_success_status_is_http_error() {
        let url = serve_once(|mut stream| {
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            let _ = stream.write_all(b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        });
        let client = build_client(&config_with_timeout(5)).unwrap();
        assert_eq!(get_text(&client, &url), Err(FetchError::Http(503)));
    }
}
