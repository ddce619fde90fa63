/// Site registry for the Jackson River dashboard.
///
/// Defines the ordered list of sites shown on the dashboard, along with the
/// data source for each and its threshold table. Registry order is display
/// order. The compiled-in registry can be replaced by `[[sites]]` tables in
/// the configuration file; both paths go through `SiteRegistry::new`, which
/// enforces the invariants below.

use crate::alert::thresholds::Thresholds;
use serde::Deserialize;
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// Site metadata
// ---------------------------------------------------------------------------

/// Where a site's values come from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SiteKind {
    /// A USGS gauge.
    Gauge { site_id: String },
    /// A USGS gauge below a dam that also publishes a next-day release forecast.
    ForecastDam { site_id: String },
    /// The lake-level feed.
    Reservoir,
    /// Flow computed as `flow(minuend) - flow(subtrahend)`.
    Synthetic { minuend: String, subtrahend: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SiteDescriptor {
    /// Display name; unique within the registry.
    pub name: String,
    #[serde(flatten)]
    pub kind: SiteKind,
    #[serde(default)]
    pub thresholds: Option<Thresholds>,
}

impl SiteDescriptor {
    pub fn gauge(name: &str, site_id: &str, thresholds: Option<Thresholds>) -> Self {
        Self {
            name: name.to_string(),
            kind: SiteKind::Gauge { site_id: site_id.to_string() },
            thresholds,
        }
    }

    /// USGS site id, for sites fetched from the water-data service.
    pub fn site_id(&self) -> Option<&str> {
        match &self.kind {
            SiteKind::Gauge { site_id } | SiteKind::ForecastDam { site_id } => Some(site_id),
            SiteKind::Reservoir | SiteKind::Synthetic { .. } => None,
        }
    }

    /// Stable element key: the display name with spaces replaced by `_`.
    pub fn key(&self) -> String {
        site_key(&self.name)
    }
}

pub fn site_key(name: &str) -> String {
    name.replace(' ', "_")
}

/// Public USGS page for a monitoring location.
pub fn usgs_location_url(site_id: &str) -> String {
    format!("https://waterdata.usgs.gov/monitoring-location/{}/", site_id)
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// A validated, ordered list of sites.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteRegistry {
    sites: Vec<SiteDescriptor>,
}

impl SiteRegistry {
    /// Validates and wraps a site list.
    ///
    /// Rejects duplicate names, malformed USGS ids, threshold tables that
    /// do not line up with the palette, more than one reservoir, and synthetic
    /// sites whose operands are not USGS-backed sites in the same registry.
    pub fn new(sites: Vec<SiteDescriptor>) -> Result<Self, String> {
        let mut names = HashSet::new();
        for site in &sites {
            if !names.insert(site.name.as_str()) {
                return Err(format!("duplicate site name '{}'", site.name));
            }
            if let Some(id) = site.site_id() {
                if id.len() < 8 || !id.chars().all(|c| c.is_ascii_digit()) {
                    return Err(format!(
                        "site id for '{}' should be at least 8 digits, got '{}'",
                        site.name, id
                    ));
                }
            }
            if let Some(t) = &site.thresholds {
                t.validate().map_err(|e| format!("thresholds for '{}': {}", site.name, e))?;
            }
        }

        let reservoirs = sites.iter().filter(|s| s.kind == SiteKind::Reservoir).count();
        if reservoirs > 1 {
            return Err(format!("only one reservoir site is supported, found {}", reservoirs));
        }

        for site in &sites {
            if let SiteKind::Synthetic { minuend, subtrahend } = &site.kind {
                for operand in [minuend, subtrahend] {
                    let backed = sites
                        .iter()
                        .find(|s| &s.name == operand)
                        .map(|s| s.site_id().is_some())
                        .unwrap_or(false);
                    if !backed {
                        return Err(format!(
                            "synthetic site '{}' refers to '{}', which is not a USGS site in the registry",
                            site.name, operand
                        ));
                    }
                }
            }
        }

        Ok(Self { sites })
    }

    pub fn sites(&self) -> &[SiteDescriptor] {
        &self.sites
    }

    pub fn find(&self, name: &str) -> Option<&SiteDescriptor> {
        self.sites.iter().find(|s| s.name == name)
    }

    /// Sites fetched from the water-data service, in display order.
    pub fn usgs_sites(&self) -> impl Iterator<Item = &SiteDescriptor> {
        self.sites.iter().filter(|s| s.site_id().is_some())
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self { sites: default_sites() }
    }
}

/// Jackson River sites from Bacova down to Rose Dale, with Lake Moomaw and
/// Gathright Dam in between.
///
/// Sources:
///   - Site ids: USGS NWIS (waterservices.usgs.gov)
///   - Forecast: USACE Norfolk District projected releases for Gathright Dam
pub fn default_sites() -> Vec<SiteDescriptor> {
    vec![
        SiteDescriptor::gauge(
            "At Bacova",
            "02011400",
            Some(Thresholds::flow(&[100.0, 300.0, 500.0, 800.0])),
        ),
        SiteDescriptor {
            name: "Lake Moomaw".to_string(),
            kind: SiteKind::Reservoir,
            thresholds: None,
        },
        SiteDescriptor {
            name: "Below Gathright Dam".to_string(),
            kind: SiteKind::ForecastDam { site_id: "02011800".to_string() },
            thresholds: Some(Thresholds::flow(&[200.0, 800.0, 1000.0, 3000.0])),
        },
        SiteDescriptor::gauge(
            "At Falling Spring",
            "02012500",
            Some(Thresholds::height(&[4.0, 7.0, 9.0, 10.0])),
        ),
        SiteDescriptor::gauge("At Water Filtration Plant", "02012800", None),
        // Ungauged reach: Rose Dale minus the Dunlap Creek tributary.
        SiteDescriptor {
            name: "Above Dunlap Creek".to_string(),
            kind: SiteKind::Synthetic {
                minuend: "At Rose Dale".to_string(),
                subtrahend: "Dunlap Creek".to_string(),
            },
            thresholds: Some(Thresholds::flow(&[200.0, 800.0, 1000.0, 3000.0])),
        },
        SiteDescriptor::gauge(
            "Dunlap Creek",
            "02013000",
            Some(Thresholds::flow(&[50.0, 300.0, 500.0, 1000.0])),
        ),
        SiteDescriptor::gauge(
            "At Rose Dale",
            "02013100",
            Some(Thresholds::flow(&[200.0, 600.0, 1000.0, 3000.0])),
        ),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
