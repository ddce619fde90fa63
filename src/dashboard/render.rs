//! HTML page and console summary for a `Dashboard`.

use super::{Dashboard, Field, SitePanel};
use std::fmt::Write as _;
use std::io;
use std::path::Path;

const STYLE: &str = "\
body { font-family: sans-serif; background: #f4f4f4; margin: 1em; }
#siteBar { list-style: none; display: flex; flex-wrap: wrap; gap: 1em; padding: 0; }
#siteBar li { border-left: 6px solid var(--color, gray); background: white; padding: 0.5em 1em; }
.siteLabel { font-size: 1.1em; margin: 0 0 0.3em 0; }
.siteLabel a { color: inherit; }
.siteData { margin: 0 0.8em 0 0; font-weight: bold; }
.updated { color: gray; font-size: 0.8em; }
";

/// Escapes text for use in HTML content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders the full page. `refresh_secs` sets the browser's reload interval.
pub fn render_html(dashboard: &Dashboard, refresh_secs: u64) -> String {
    let mut html = String::new();
    let title = escape_html(&dashboard.title);
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <meta http-equiv=\"refresh\" content=\"{}\">\n<title>{}</title>\n<style>\n{}</style>\n</head>\n<body>\n<h1>{}</h1>\n",
        refresh_secs, title, STYLE, title
    );
    html.push_str("<ul id=\"siteBar\">\n");
    for panel in &dashboard.panels {
        render_panel(&mut html, panel);
    }
    html.push_str("</ul>\n");
    if let Some(at) = dashboard.updated_at {
        let _ = writeln!(
            html,
            "<p class=\"updated\">Updated {}</p>",
            at.format("%Y-%m-%d %H:%M UTC")
        );
    }
    html.push_str("</body>\n</html>\n");
    html
}

fn render_panel(html: &mut String, panel: &SitePanel) {
    let color_var = panel
        .color
        .map(|c| format!(" style=\"--color: {}\"", c))
        .unwrap_or_default();
    let display = if panel.visible { "block" } else { "none" };
    let _ = writeln!(html, "<li{}>", color_var);
    let _ = writeln!(
        html,
        "<div id=\"{}\" class=\"siteDiv\" style=\"display: {}{}\">",
        escape_html(&panel.container_id()),
        display,
        panel.color.map(|c| format!("; color: {}", c)).unwrap_or_default()
    );

    let name = escape_html(&panel.name);
    let tooltip = panel
        .source_name
        .as_ref()
        .map(|s| format!(" title=\"{}\"", escape_html(s)))
        .unwrap_or_default();
    match &panel.link {
        Some(link) => {
            let _ = writeln!(
                html,
                "<h2 class=\"siteLabel\"{}><a href=\"{}\" target=\"_blank\">{}</a></h2>",
                tooltip,
                escape_html(link),
                name
            );
        }
        None => {
            let _ = writeln!(html, "<h2 class=\"siteLabel\"{}>{}</h2>", tooltip, name);
        }
    }

    for field in &panel.fields {
        render_field(html, panel, field);
    }
    html.push_str("</div>\n</li>\n");
}

fn render_field(html: &mut String, panel: &SitePanel, field: &Field) {
    let mut style = format!("display: {}", if field.visible { "inline" } else { "none" });
    if let Some(c) = field.color {
        let _ = write!(style, "; color: {}", c);
    }
    let _ = writeln!(
        html,
        "<p class=\"siteData\" id=\"{}\" style=\"{}\">{}</p>",
        escape_html(&panel.element_id(field.kind)),
        style,
        escape_html(&field.text)
    );
}

/// Writes the page next to `path` and renames it into place, so a browser
/// never loads a half-written file.
pub fn write_html(path: &Path, dashboard: &Dashboard, refresh_secs: u64) -> io::Result<()> {
    let tmp = path.with_extension("html.tmp");
    std::fs::write(&tmp, render_html(dashboard, refresh_secs))?;
    std::fs::rename(&tmp, path)
}

/// One line per visible site, for the console.
pub fn render_summary(dashboard: &Dashboard) -> String {
    let mut out = String::new();
    for panel in &dashboard.panels {
        if !panel.visible {
            let _ = writeln!(out, "{:<28} (no data)", panel.name);
            continue;
        }
        let values: Vec<&str> = panel
            .fields
            .iter()
            .filter(|f| f.visible)
            .map(|f| f.text.as_str())
            .collect();
        let color = panel.color.map(|c| c.css_name()).unwrap_or("-");
        let _ = writeln!(out, "{:<28} {:<11} {}", panel.name, color, values.join("  "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::Color;
    use crate::config::Endpoints;
    use crate::dashboard::refresh::{Reading, SiteStatus};
    use crate::model::Observation;
    use crate::sites::SiteRegistry;

    fn updated_dashboard() -> Dashboard {
        let mut d = Dashboard::build("Jackson <River>", &SiteRegistry::default(), &Endpoints::default());
        d.apply(&SiteStatus {
            name: "At Bacova".into(),
            reading: Reading::Gauge {
                observation: Some(Observation { flow: Some(250.0), ..Default::default() }),
                level_color: Some(Color::Green),
                temp_color: Color::Gray,
                forecast: None,
            },
            failed_fetches: 0,
        });
        d.apply(&SiteStatus {
            name: "Dunlap Creek".into(),
            reading: Reading::Gauge {
                observation: None,
                level_color: None,
                temp_color: Color::Gray,
                forecast: None,
            },
            failed_fetches: 1,
        });
        d
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_page_contains_keyed_elements() {
        let html = render_html(&updated_dashboard(), 900);
        assert!(html.contains("<title>Jackson &lt;River&gt;</title>"));
        assert!(html.contains("content=\"900\""));
        assert!(html.contains(
            "<p class=\"siteData\" id=\"At_Bacova_flow\" style=\"display: inline; color: green\">250 cfs</p>"
        ));
        assert!(html.contains("id=\"At_Bacova_height\" style=\"display: none\""));
        assert!(html.contains("<li style=\"--color: green\">"));
        assert!(html.contains("id=\"Dunlap_Creek_div\" class=\"siteDiv\" style=\"display: none\""));
        assert!(html.contains("id=\"Below_Gathright_Dam_tmrwFlow\""));
    }

    #[test]
    fn test_synthetic_heading_has_no_link() {
        let html = render_html(&updated_dashboard(), 900);
        assert!(html.contains("<h2 class=\"siteLabel\">Above Dunlap Creek</h2>"));
    }

    #[test]
    fn test_summary_lists_every_site() {
        let summary = render_summary(&updated_dashboard());
        assert_eq!(summary.lines().count(), 8);
        let bacova = summary.lines().find(|l| l.starts_with("At Bacova")).unwrap();
        assert!(bacova.contains("green"));
        assert!(bacova.contains("250 cfs"));
        assert!(summary.lines().any(|l| l.starts_with("Dunlap Creek") && l.ends_with("(no data)")));
    }

    #[test]
    fn test_write_html_replaces_file() {
        let dir = std::env::temp_dir().join(format!("jackson_render_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("index.html");
        write_html(&path, &updated_dashboard(), 60).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<!DOCTYPE html>"));
        assert!(!path.with_extension("html.tmp").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
