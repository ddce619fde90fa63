//! Jackson River dashboard daemon.
//!
//! Usage:
//!   jackson_dashboard                 refresh forever, every `refresh.interval_secs`
//!   jackson_dashboard --once          run a single refresh cycle and exit
//!   jackson_dashboard --replay <dir>  read captured responses instead of the network
//!   jackson_dashboard --verify        probe every data source and print a JSON report

use chrono::Utc;
use clap::Parser;
use jackson_dashboard::config::{self, DashboardConfig};
use jackson_dashboard::dashboard::refresh::refresh_cycle;
use jackson_dashboard::dashboard::render::{render_summary, write_html};
use jackson_dashboard::dashboard::Dashboard;
use jackson_dashboard::dev_mode::FixtureSource;
use jackson_dashboard::ingest::{GaugeSource, HttpGaugeSource};
use jackson_dashboard::logging::{self, DataSource};
use jackson_dashboard::sites::SiteRegistry;
use jackson_dashboard::verify;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// Jackson River gauge dashboard.
#[derive(Debug, Parser)]
#[command(name = "jackson_dashboard", version)]
#[command(about = "Polls Jackson River gauges and rewrites a color-coded HTML dashboard")]
struct Cli {
    /// Run a single refresh cycle and exit
    #[arg(long, default_value_t = false)]
    once: bool,
    /// Probe every data source once and print a JSON report
    #[arg(long, default_value_t = false, conflicts_with_all = ["replay", "once"])]
    verify: bool,
    /// Read captured responses from this directory instead of the network
    #[arg(long, value_name = "DIR")]
    replay: Option<PathBuf>,
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_logger(
        config.logging.level,
        config.logging.file.as_deref(),
        config.logging.console_timestamps,
    );

    let outcome = if cli.verify { run_verify(&config) } else { run_dashboard(&config, &cli) };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logging::error(DataSource::System, None, &e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run_verify(config: &DashboardConfig) -> Result<(), Box<dyn Error>> {
    let report = verify::run_full_verification(config)?;
    verify::print_summary(&report);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_dashboard(config: &DashboardConfig, cli: &Cli) -> Result<(), Box<dyn Error>> {
    let registry = config.registry()?;
    match &cli.replay {
        Some(dir) => {
            logging::info(
                DataSource::System,
                None,
                &format!("Replaying captured responses from {}", dir.display()),
            );
            let source = FixtureSource::new(dir).with_forecast_path(config.forecast.cell_path.clone());
            run_loop(&source, config, &registry, cli.once)
        }
        None => {
            let source = HttpGaugeSource::from_config(config)?;
            run_loop(&source, config, &registry, cli.once)
        }
    }
}

fn run_loop<S: GaugeSource>(
    source: &S,
    config: &DashboardConfig,
    registry: &SiteRegistry,
    once: bool,
) -> Result<(), Box<dyn Error>> {
    let mut dashboard = Dashboard::build(&config.output.title, registry, &config.endpoints);
    logging::info(
        DataSource::System,
        None,
        &format!(
            "Monitoring {} sites, writing {}",
            registry.len(),
            config.output.html_path.display()
        ),
    );

    loop {
        let now = Utc::now();
        let report = refresh_cycle(source, registry, now.date_naive());
        dashboard.apply_cycle(&report, now);

        if let Err(e) = write_html(&config.output.html_path, &dashboard, config.refresh.interval_secs) {
            logging::error(
                DataSource::System,
                None,
                &format!("Failed to write {}: {}", config.output.html_path.display(), e),
            );
        }
        print!("{}", render_summary(&dashboard));
        logging::log_cycle_summary(registry.len(), report.reporting(), report.failed_fetches());

        if once {
            return Ok(());
        }
        std::thread::sleep(Duration::from_secs(config.refresh.interval_secs));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags_runs_forever_against_network() {
        let cli = Cli::try_parse_from(["jackson_dashboard"]).unwrap();
        assert!(!cli.once && !cli.verify);
        assert!(cli.replay.is_none());
    }

    #[test]
    fn test_replay_takes_a_directory() {
        let cli = Cli::try_parse_from(["jackson_dashboard", "--once", "--replay", "tests/fixtures"]).unwrap();
        assert!(cli.once);
        assert_eq!(cli.replay, Some(PathBuf::from("tests/fixtures")));
    }

    #[test]
    fn test_replay_without_directory_is_rejected() {
        assert!(Cli::try_parse_from(["jackson_dashboard", "--replay"]).is_err());
    }

    #[test]
    fn test_verify_conflicts_with_replay() {
        let err = Cli::try_parse_from(["jackson_dashboard", "--verify", "--replay", "tests/fixtures"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_help_is_available() {
        let err = Cli::try_parse_from(["jackson_dashboard", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        assert!(err.to_string().contains("--replay <DIR>"));
    }
}
