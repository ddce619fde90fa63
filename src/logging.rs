//! Process-wide logging tagged by data source and site.
//!
//! Console output goes to stdout/stderr; an optional file receives every
//! entry with a UTC timestamp.

use crate::model::FetchError;
use chrono::Utc;
use serde::Deserialize;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Data Sources
// ---------------------------------------------------------------------------

/// Which remote service (or the daemon itself) a message concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// USGS water services (flow, gage height, temperature)
    Usgs,
    /// USACE dam release forecast page
    Usace,
    /// Lake level feed
    Lake,
    System,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataSource::Usgs => "USGS",
            DataSource::Usace => "USACE",
            DataSource::Lake => "LAKE",
            DataSource::System => "SYS",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Source is known to drop out briefly
    Expected,
    /// Service degradation or a format change
    Unexpected,
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureType::Expected => "expected",
            FailureType::Unexpected => "unexpected",
            FailureType::Unknown => "unclassified",
        })
    }
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

static SINK: Mutex<Option<Sink>> = Mutex::new(None);

struct Sink {
    min_level: LogLevel,
    log_file: Option<PathBuf>,
    /// Console lines use the full file format instead of the short one.
    console_timestamps: bool,
}

impl Sink {
    fn write(&self, level: LogLevel, source: DataSource, site: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }
        let entry = format_entry(level, source, site, message);

        let console = if self.console_timestamps {
            entry.clone()
        } else {
            short_entry(level, source, site, message)
        };
        if level >= LogLevel::Warning {
            eprintln!("{}", console);
        } else {
            println!("{}", console);
        }

        if let Some(path) = &self.log_file {
            let appended = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| writeln!(file, "{}", entry));
            if let Err(e) = appended {
                eprintln!("log file {}: {}", path.display(), e);
            }
        }
    }
}

/// One log line: `2024-05-01 13:00:00 UTC WARN USGS [At Bacova]: message`.
fn format_entry(level: LogLevel, source: DataSource, site: Option<&str>, message: &str) -> String {
    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    format!("{} {} {}{}: {}", timestamp, level, source, site_tag(site), message)
}

/// Console line without timestamp: `⚠ USGS [At Bacova]: message`.
fn short_entry(level: LogLevel, source: DataSource, site: Option<&str>, message: &str) -> String {
    let marker = match level {
        LogLevel::Error => "✗ ",
        LogLevel::Warning => "⚠ ",
        LogLevel::Info => "",
        LogLevel::Debug => "· ",
    };
    match (level, site) {
        (LogLevel::Info, None) => message.to_string(),
        _ => format!("{}{}{}: {}", marker, source, site_tag(site), message),
    }
}

fn site_tag(site: Option<&str>) -> String {
    site.map(|s| format!(" [{}]", s)).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Installs the process-wide sink. Until this is called, messages are dropped.
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    if let Ok(mut sink) = SINK.lock() {
        *sink = Some(Sink {
            min_level,
            log_file: log_file.map(PathBuf::from),
            console_timestamps,
        });
    }
}

fn log(level: LogLevel, source: DataSource, site: Option<&str>, message: &str) {
    if let Ok(sink) = SINK.lock() {
        if let Some(sink) = sink.as_ref() {
            sink.write(level, source, site, message);
        }
    }
}

pub fn info(source: DataSource, site: Option<&str>, message: &str) {
    log(LogLevel::Info, source, site, message);
}

pub fn warn(source: DataSource, site: Option<&str>, message: &str) {
    log(LogLevel::Warning, source, site, message);
}

pub fn error(source: DataSource, site: Option<&str>, message: &str) {
    log(LogLevel::Error, source, site, message);
}

pub fn debug(source: DataSource, site: Option<&str>, message: &str) {
    log(LogLevel::Debug, source, site, message);
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

/// Classify a fetch failure by source and error kind.
///
/// Parse errors mean the remote format changed (or the scraped page was
/// redesigned) and need attention. Server errors are degradation. Transport
/// errors and client errors are usually transient or a gauge being offline.
pub fn classify_failure(source: DataSource, err: &FetchError) -> FailureType {
    match (source, err) {
        (_, FetchError::Parse(_)) => FailureType::Unexpected,
        (_, FetchError::Http(code)) if *code >= 500 => FailureType::Unexpected,
        // The forecast page is behind a slow government host; timeouts are routine.
        (DataSource::Usace, FetchError::Network(msg)) if msg.contains("timed out") => {
            FailureType::Expected
        }
        _ => FailureType::Unknown,
    }
}

/// Logs a failed fetch at a level chosen by `classify_failure`.
pub fn log_fetch_failure(source: DataSource, site: Option<&str>, operation: &str, err: &FetchError) {
    let kind = classify_failure(source, err);
    let message = format!("{} failed ({}): {}", operation, kind, err);
    match kind {
        FailureType::Expected => debug(source, site, &message),
        FailureType::Unexpected => error(source, site, &message),
        FailureType::Unknown => warn(source, site, &message),
    }
}

/// End-of-cycle line; escalates to error when nothing reported at all.
pub fn log_cycle_summary(total: usize, reporting: usize, failed: usize) {
    let message = format!(
        "Refresh complete: {}/{} sites reporting, {} fetches failed",
        reporting, total, failed
    );

    if failed == 0 {
        info(DataSource::System, None, &message);
    } else if reporting == 0 {
        error(DataSource::System, None, &message);
    } else {
        warn(DataSource::System, None, &message);
    }
}
