//! The dashboard's display surface.
//!
//! A `Dashboard` is a tree of named containers, one `SitePanel` per
//! registered site in registry order. Each panel exposes up to four keyed
//! fields; text, visibility and color of panels and fields are the only
//! observable state. `refresh` produces per-site results and `apply` writes
//! them here; `render` turns the tree into HTML and console text.
//!
//! Submodules:
//! - `refresh`: one refresh cycle over the registry
//! - `render`: HTML page and console summary

pub mod refresh;
pub mod render;

use crate::alert::reservoir::full_pool_suffix;
use crate::alert::Color;
use crate::config::Endpoints;
use crate::sites::{usgs_location_url, SiteKind, SiteRegistry};
use chrono::{DateTime, Utc};
use refresh::{CycleReport, Reading, SiteStatus};

// ---------------------------------------------------------------------------
// Fields and panels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Flow,
    Height,
    Temperature,
    Forecast,
    Level,
}

impl FieldKind {
    /// Suffix of the field's element id.
    pub fn id_suffix(self) -> &'static str {
        match self {
            FieldKind::Flow => "flow",
            FieldKind::Height => "height",
            FieldKind::Temperature => "temp",
            FieldKind::Forecast => "tmrwFlow",
            FieldKind::Level => "level",
        }
    }

    /// Text shown before the first successful update.
    pub fn placeholder(self) -> &'static str {
        match self {
            FieldKind::Flow => "-- cfs",
            FieldKind::Height | FieldKind::Level => "-- ft",
            FieldKind::Temperature => "-- °F",
            FieldKind::Forecast => "-- cfs tomorrow",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub kind: FieldKind,
    pub text: String,
    pub visible: bool,
    pub color: Option<Color>,
}

impl Field {
    fn new(kind: FieldKind) -> Self {
        let color = match kind {
            FieldKind::Forecast | FieldKind::Level => Some(Color::Gray),
            _ => None,
        };
        Self { kind, text: kind.placeholder().to_string(), visible: true, color }
    }

    fn show(&mut self, text: String, color: Option<Color>) {
        self.text = text;
        self.visible = true;
        self.color = color;
    }

    fn hide(&mut self) {
        self.visible = false;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SitePanel {
    /// Stable element key derived from the display name.
    pub key: String,
    pub name: String,
    /// Heading link target.
    pub link: Option<String>,
    /// Official site name reported by the data source, shown as a tooltip.
    pub source_name: Option<String>,
    pub visible: bool,
    /// Container color; `None` is neutral.
    pub color: Option<Color>,
    pub fields: Vec<Field>,
}

impl SitePanel {
    pub fn field(&self, kind: FieldKind) -> Option<&Field> {
        self.fields.iter().find(|f| f.kind == kind)
    }

    fn field_mut(&mut self, kind: FieldKind) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.kind == kind)
    }

    /// Element id of a field, e.g. `At_Bacova_flow`.
    pub fn element_id(&self, kind: FieldKind) -> String {
        format!("{}_{}", self.key, kind.id_suffix())
    }

    /// Container element id, e.g. `At_Bacova_div`.
    pub fn container_id(&self) -> String {
        format!("{}_div", self.key)
    }

    fn set_field(&mut self, kind: FieldKind, text: Option<String>, color: Option<Color>) {
        if let Some(field) = self.field_mut(kind) {
            match text {
                Some(text) => field.show(text, color),
                None => field.hide(),
            }
        }
    }

    fn apply_gauge(&mut self, reading: &Reading) {
        let Reading::Gauge { observation, level_color, temp_color, forecast } = reading else {
            return;
        };
        let Some(obs) = observation else {
            // The fetch failed: indistinguishable from a site reporting nothing.
            self.fields.iter_mut().for_each(Field::hide);
            self.visible = false;
            return;
        };

        self.set_field(FieldKind::Flow, obs.flow.map(|v| format!("{} cfs", v)), *level_color);
        self.set_field(FieldKind::Height, obs.height.map(|v| format!("{} ft", v)), *level_color);
        self.set_field(
            FieldKind::Temperature,
            obs.temperature.map(|v| format!("{} °F", v)),
            Some(*temp_color),
        );

        // Flow/height color the whole panel; temperature only when it is alone.
        self.color = if obs.flow.is_some() || obs.height.is_some() {
            *level_color
        } else if obs.temperature.is_some() {
            Some(*temp_color)
        } else {
            None
        };
        self.source_name = obs.source.as_ref().map(|s| s.site_name.clone());
        self.visible = !obs.is_empty();

        self.set_field(
            FieldKind::Forecast,
            forecast.as_ref().map(|text| format!("{} tomorrow", text)),
            Some(Color::Gray),
        );
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub title: String,
    pub panels: Vec<SitePanel>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Dashboard {
    /// Lays out one panel per site.
    ///
    /// Gauges get flow, height and temperature fields; the forecast dam adds
    /// a forecast field; synthetic sites only have flow; the reservoir only
    /// has a level field.
    pub fn build(title: &str, registry: &SiteRegistry, endpoints: &Endpoints) -> Self {
        let panels = registry
            .sites()
            .iter()
            .map(|site| {
                let (link, kinds) = match &site.kind {
                    SiteKind::Gauge { site_id } => (
                        Some(usgs_location_url(site_id)),
                        vec![FieldKind::Flow, FieldKind::Height, FieldKind::Temperature],
                    ),
                    SiteKind::ForecastDam { .. } => (
                        Some(endpoints.forecast_url.clone()),
                        vec![
                            FieldKind::Flow,
                            FieldKind::Height,
                            FieldKind::Temperature,
                            FieldKind::Forecast,
                        ],
                    ),
                    SiteKind::Reservoir => (Some(endpoints.lake_url.clone()), vec![FieldKind::Level]),
                    SiteKind::Synthetic { .. } => (None, vec![FieldKind::Flow]),
                };
                SitePanel {
                    key: site.key(),
                    name: site.name.clone(),
                    link,
                    source_name: None,
                    visible: true,
                    color: None,
                    fields: kinds.into_iter().map(Field::new).collect(),
                }
            })
            .collect();

        Self { title: title.to_string(), panels, updated_at: None }
    }

    pub fn panel(&self, name: &str) -> Option<&SitePanel> {
        self.panels.iter().find(|p| p.name == name)
    }

    /// Writes one site's result into its panel. Unknown names are ignored.
    pub fn apply(&mut self, status: &SiteStatus) {
        let Some(panel) = self.panels.iter_mut().find(|p| p.name == status.name) else {
            return;
        };

        match &status.reading {
            Reading::Gauge { .. } => panel.apply_gauge(&status.reading),
            Reading::Synthetic { flow, color } => {
                panel.set_field(FieldKind::Flow, flow.map(|v| format!("{} cfs", v)), *color);
                panel.color = *color;
                panel.visible = flow.is_some();
            }
            Reading::Reservoir { level, color } => {
                panel.set_field(
                    FieldKind::Level,
                    level.map(|l| format!("{} ft {}", l, full_pool_suffix(l))),
                    Some(*color),
                );
                panel.color = Some(*color);
                panel.visible = level.is_some();
            }
        }
    }

    pub fn apply_cycle(&mut self, report: &CycleReport, at: DateTime<Utc>) {
        for status in &report.statuses {
            self.apply(status);
        }
        self.updated_at = Some(at);
    }
}
