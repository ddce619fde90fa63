/// USACE Gathright Dam projected-release page.
///
/// The Norfolk District publishes projected outflows for Gathright Dam as an
/// HTML table with no ids or classes. The "tomorrow" cell is located by a
/// fixed child-element path from `<body>`; if the page layout changes the
/// path must be updated in configuration.
///
/// Page: https://www.nao-wc.usace.army.mil/nao/projected_Q.html

use crate::ingest::html;
use crate::model::FetchError;

pub const FORECAST_URL: &str = "https://www.nao-wc.usace.army.mil/nao/projected_Q.html";

/// Child-element path from `<body>` to the flow row of the projection table.
pub const FLOW_ROW_PATH: [usize; 8] = [1, 3, 0, 0, 1, 6, 0, 1];

/// Column of the flow row holding today's projected release.
pub const TODAY_COLUMN: usize = 1;

/// Column of the flow row holding tomorrow's projected release.
pub const TOMORROW_COLUMN: usize = 2;

/// Full path from `<body>` to the "tomorrow" cell.
pub fn default_forecast_path() -> Vec<usize> {
    let mut path = FLOW_ROW_PATH.to_vec();
    path.push(TOMORROW_COLUMN);
    path
}

/// Extracts the text of the cell at `path` (relative to `<body>`).
///
/// The text is returned exactly as displayed on the page; it is not parsed
/// as a number.
pub fn extract_forecast_text(page: &str, path: &[usize]) -> Result<String, FetchError> {
    let document = html::parse_document(page);
    let body = html::body(&document);
    body.descend(path)
        .map(|cell| cell.text_content())
        .map_err(|depth| {
            FetchError::Parse(format!(
                "forecast page layout changed: no element at step {} of path {:?}",
                depth, path
            ))
        })
}
