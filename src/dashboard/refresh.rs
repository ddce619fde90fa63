//! One refresh cycle over the site registry.
//!
//! Every USGS-backed site is fetched on its own scoped thread, and the
//! reservoir on another. Completions arrive in any order; nothing is
//! written to the dashboard until all workers have joined. Synthetic sites
//! are computed after the join from their operands' results, so they never
//! read a half-finished cycle.
//!
//! Every fetch failure is logged and turned into an absent value here. None
//! of them reach the caller.

use crate::alert::reservoir::classify_reservoir;
use crate::alert::temperature::classify_temperature;
use crate::alert::thresholds::classify_by_threshold;
use crate::alert::Color;
use crate::ingest::GaugeSource;
use crate::logging::{self, DataSource};
use crate::model::{round_half_up, Observation};
use crate::sites::{SiteDescriptor, SiteKind, SiteRegistry};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::thread;

/// Display-ready values for one site.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Gauge {
        /// `None` when the fetch failed.
        observation: Option<Observation>,
        /// Combined flow/height color; `None` leaves the display neutral.
        level_color: Option<Color>,
        temp_color: Color,
        /// Tomorrow's forecast text, for the forecast dam only.
        forecast: Option<String>,
    },
    Synthetic {
        flow: Option<f64>,
        color: Option<Color>,
    },
    Reservoir {
        level: Option<f64>,
        color: Color,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteStatus {
    pub name: String,
    pub reading: Reading,
    /// Fetches for this site that failed this cycle.
    pub failed_fetches: usize,
}

impl SiteStatus {
    /// True when at least one value will be shown.
    pub fn is_reporting(&self) -> bool {
        match &self.reading {
            Reading::Gauge { observation, .. } => {
                observation.as_ref().map(|o| !o.is_empty()).unwrap_or(false)
            }
            Reading::Synthetic { flow, .. } => flow.is_some(),
            Reading::Reservoir { level, .. } => level.is_some(),
        }
    }

    fn flow(&self) -> Option<f64> {
        match &self.reading {
            Reading::Gauge { observation, .. } => observation.as_ref().and_then(|o| o.flow),
            Reading::Synthetic { flow, .. } => *flow,
            Reading::Reservoir { .. } => None,
        }
    }
}

/// Results of one cycle, in registry order.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub statuses: Vec<SiteStatus>,
}

impl CycleReport {
    pub fn status(&self, name: &str) -> Option<&SiteStatus> {
        self.statuses.iter().find(|s| s.name == name)
    }

    pub fn reporting(&self) -> usize {
        self.statuses.iter().filter(|s| s.is_reporting()).count()
    }

    pub fn failed_fetches(&self) -> usize {
        self.statuses.iter().map(|s| s.failed_fetches).sum()
    }
}

// ---------------------------------------------------------------------------
// Cycle
// ---------------------------------------------------------------------------

/// Fetches every site once and derives its display values.
///
/// `today` selects the lake-level day; pass the current UTC date.
pub fn refresh_cycle<S: GaugeSource>(
    source: &S,
    registry: &SiteRegistry,
    today: NaiveDate,
) -> CycleReport {
    let mut by_name: HashMap<String, SiteStatus> = thread::scope(|scope| {
        let workers: Vec<_> = registry
            .sites()
            .iter()
            .filter(|site| !matches!(site.kind, SiteKind::Synthetic { .. }))
            .map(|site| {
                let handle = scope.spawn(move || match &site.kind {
                    SiteKind::Reservoir => refresh_reservoir(source, site, today),
                    _ => refresh_gauge(source, site),
                });
                (site, handle)
            })
            .collect();

        workers
            .into_iter()
            .map(|(site, handle)| {
                let status = handle.join().unwrap_or_else(|_| {
                    logging::error(DataSource::System, Some(&site.name), "refresh worker panicked");
                    failed_status(site)
                });
                (site.name.clone(), status)
            })
            .collect()
    });

    for site in registry.sites() {
        if let SiteKind::Synthetic { minuend, subtrahend } = &site.kind {
            let flow = |name: &str| by_name.get(name).and_then(SiteStatus::flow);
            let status = synthetic_status(site, flow(minuend), flow(subtrahend));
            by_name.insert(site.name.clone(), status);
        }
    }

    let statuses = registry
        .sites()
        .iter()
        .filter_map(|site| by_name.remove(&site.name))
        .collect();
    CycleReport { statuses }
}

fn refresh_gauge<S: GaugeSource>(source: &S, site: &SiteDescriptor) -> SiteStatus {
    let site_id = site.site_id().unwrap_or_default();
    let observation = match source.get_observation(site_id) {
        Ok(obs) => obs,
        Err(e) => {
            logging::log_fetch_failure(DataSource::Usgs, Some(&site.name), "get_observation", &e);
            return failed_status(site);
        }
    };
    logging::debug(
        DataSource::Usgs,
        Some(&site.name),
        &format!(
            "flow={:?} height={:?} temp={:?}",
            observation.flow, observation.height, observation.temperature
        ),
    );

    let mut failed_fetches = 0;
    // The forecast is only requested once the gauge itself has answered.
    let forecast = match site.kind {
        SiteKind::ForecastDam { .. } => match source.fetch_forecast_text() {
            Ok(text) => Some(text),
            Err(e) => {
                logging::log_fetch_failure(DataSource::Usace, Some(&site.name), "fetch_forecast_text", &e);
                failed_fetches += 1;
                None
            }
        },
        _ => None,
    };

    SiteStatus {
        name: site.name.clone(),
        reading: Reading::Gauge {
            level_color: classify_by_threshold(
                site.thresholds.as_ref(),
                observation.flow,
                observation.height,
            ),
            temp_color: classify_temperature(observation.temperature),
            observation: Some(observation),
            forecast,
        },
        failed_fetches,
    }
}

fn refresh_reservoir<S: GaugeSource>(source: &S, site: &SiteDescriptor, today: NaiveDate) -> SiteStatus {
    let (level, failed_fetches) = match source.get_reservoir_level(today) {
        Ok(level) => (level, 0),
        Err(e) => {
            logging::log_fetch_failure(DataSource::Lake, Some(&site.name), "get_reservoir_level", &e);
            (None, 1)
        }
    };
    if level.is_none() && failed_fetches == 0 {
        logging::warn(DataSource::Lake, Some(&site.name), "no level reported yet this year");
    }
    SiteStatus {
        name: site.name.clone(),
        reading: Reading::Reservoir { level, color: classify_reservoir(level) },
        failed_fetches,
    }
}

/// `minuend - subtrahend`, shown only when both flows were fetched this cycle.
fn synthetic_status(site: &SiteDescriptor, minuend: Option<f64>, subtrahend: Option<f64>) -> SiteStatus {
    // Operands are already at 0.1 cfs; re-round to drop float noise.
    let flow = minuend.zip(subtrahend).map(|(m, s)| round_half_up(m - s, 1));
    SiteStatus {
        name: site.name.clone(),
        reading: Reading::Synthetic {
            flow,
            color: classify_by_threshold(site.thresholds.as_ref(), flow, None),
        },
        failed_fetches: 0,
    }
}

fn failed_status(site: &SiteDescriptor) -> SiteStatus {
    let reading = match site.kind {
        SiteKind::Reservoir => Reading::Reservoir { level: None, color: Color::Gray },
        SiteKind::Synthetic { .. } => Reading::Synthetic { flow: None, color: None },
        _ => Reading::Gauge {
            observation: None,
            level_color: None,
            temp_color: Color::Gray,
            forecast: None,
        },
    };
    SiteStatus { name: site.name.clone(), reading, failed_fetches: 1 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::thresholds::Thresholds;
    use crate::model::FetchError;

    /// Answers from fixed tables; unknown sites fail with a network error.
    struct StubSource {
        observations: HashMap<&'static str, Observation>,
        forecast: Result<String, FetchError>,
        level: Option<f64>,
    }

    impl GaugeSource for StubSource {
        fn get_observation(&self, site_id: &str) -> Result<Observation, FetchError> {
            self.observations
                .get(site_id)
                .cloned()
                .ok_or_else(|| FetchError::Network(format!("no route to {}", site_id)))
        }

        fn fetch_forecast_text(&self) -> Result<String, FetchError> {
            match &self.forecast {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(FetchError::Http(502)),
            }
        }

        fn get_reservoir_level(&self, _today: NaiveDate) -> Result<Option<f64>, FetchError> {
            Ok(self.level)
        }
    }

    fn flow(v: f64) -> Observation {
        Observation { flow: Some(v), ..Default::default() }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 30).unwrap()
    }

    fn stub(observations: &[(&'static str, Observation)]) -> StubSource {
        StubSource {
            observations: observations.iter().cloned().collect(),
            forecast: Ok("450".to_string()),
            level: Some(1581.3),
        }
    }

    #[test]
    fn test_synthetic_is_difference_of_operands() {
        let source = stub(&[("02013000", flow(120.0)), ("02013100", flow(450.0))]);
        let report = refresh_cycle(&source, &SiteRegistry::default(), today());
        let status = report.status("Above Dunlap Creek").unwrap();
        assert_eq!(
            status.reading,
            Reading::Synthetic { flow: Some(330.0), color: Some(Color::Green) }
        );
    }

    #[test]
    fn test_synthetic_rounds_float_noise() {
        let source = stub(&[("02013000", flow(100.2)), ("02013100", flow(300.3))]);
        let report = refresh_cycle(&source, &SiteRegistry::default(), today());
        match &report.status("Above Dunlap Creek").unwrap().reading {
            Reading::Synthetic { flow, .. } => assert_eq!(*flow, Some(200.1)),
            other => panic!("unexpected reading {:?}", other),
        }
    }

    #[test]
    fn test_synthetic_hidden_when_operand_missing() {
        let source = stub(&[("02013100", flow(450.0))]);
        let report = refresh_cycle(&source, &SiteRegistry::default(), today());
        let status = report.status("Above Dunlap Creek").unwrap();
        assert_eq!(status.reading, Reading::Synthetic { flow: None, color: None });
        assert!(!status.is_reporting());
    }

    #[test]
    fn test_statuses_follow_registry_order() {
        let source = stub(&[]);
        let registry = SiteRegistry::default();
        let report = refresh_cycle(&source, &registry, today());
        let names: Vec<_> = report.statuses.iter().map(|s| s.name.as_str()).collect();
        let expected: Vec<_> = registry.sites().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_failed_gauge_does_not_stop_others() {
        let source = stub(&[("02011400", flow(250.0))]);
        let report = refresh_cycle(&source, &SiteRegistry::default(), today());
        assert!(report.status("At Bacova").unwrap().is_reporting());
        assert!(!report.status("Dunlap Creek").unwrap().is_reporting());
        // Five USGS sites failed; the dam's forecast is never requested.
        assert_eq!(report.failed_fetches(), 5);
        // Bacova and the lake.
        assert_eq!(report.reporting(), 2);
    }

    #[test]
    fn test_dam_fetches_forecast_after_gauge() {
        let source = stub(&[("02011800", flow(310.0))]);
        let report = refresh_cycle(&source, &SiteRegistry::default(), today());
        match &report.status("Below Gathright Dam").unwrap().reading {
            Reading::Gauge { forecast, level_color, .. } => {
                assert_eq!(forecast.as_deref(), Some("450"));
                assert_eq!(*level_color, Some(Color::Green));
            }
            other => panic!("unexpected reading {:?}", other),
        }
    }

    #[test]
    fn test_forecast_failure_keeps_gauge_values() {
        let mut source = stub(&[("02011800", flow(310.0))]);
        source.forecast = Err(FetchError::Http(502));
        let report = refresh_cycle(&source, &SiteRegistry::default(), today());
        let status = report.status("Below Gathright Dam").unwrap();
        assert!(status.is_reporting());
        assert_eq!(status.failed_fetches, 1);
        match &status.reading {
            Reading::Gauge { forecast, .. } => assert!(forecast.is_none()),
            other => panic!("unexpected reading {:?}", other),
        }
    }

    #[test]
    fn test_reservoir_is_classified() {
        let source = stub(&[]);
        let report = refresh_cycle(&source, &SiteRegistry::default(), today());
        assert_eq!(
            report.status("Lake Moomaw").unwrap().reading,
            Reading::Reservoir { level: Some(1581.3), color: Color::DarkOrange }
        );
    }

    #[test]
    fn test_custom_registry_without_reservoir() {
        let registry = SiteRegistry::new(vec![SiteDescriptor::gauge(
            "Test Gauge",
            "01234567",
            Some(Thresholds::height(&[1.0, 2.0, 3.0, 4.0])),
        )])
        .unwrap();
        let source = stub(&[(
            "01234567",
            Observation { height: Some(3.5), temperature: Some(41.0), ..Default::default() },
        )]);
        let report = refresh_cycle(&source, &registry, today());
        assert_eq!(report.statuses.len(), 1);
        match &report.statuses[0].reading {
            Reading::Gauge { level_color, temp_color, .. } => {
                assert_eq!(*level_color, Some(Color::Red));
                assert_eq!(*temp_color, Color::Green);
            }
            other => panic!("unexpected reading {:?}", other),
        }
    }
}
