//! Command-line runner.
//!
//! Usage:
//!   hydromon_service [--config PATH] [--from YYYY-MM-DD --to YYYY-MM-DD] [--json]
//!
//! Without a window the current day is evaluated. `DATABASE_URL` is read
//! from the environment or `.env`.

use chrono::{Local, NaiveDate};
use hydromon_service::config::{load_config, AlertConfig};
use hydromon_service::logging::{self, init_logger, Component, LogLevel};
use hydromon_service::reception::DateWindow;
use hydromon_service::runner::{self, RunReport};
use hydromon_service::store::PgReadingStore;
use std::process::ExitCode;

const DEFAULT_CONFIG_PATH: &str = "hydromon.toml";

struct Options {
    config_path: String,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    json: bool,
}

fn parse_date(flag: &str, value: Option<String>) -> Result<NaiveDate, String> {
    let value = value.ok_or_else(|| format!("{} needs a date", flag))?;
    NaiveDate::parse_from_str(&value, "%Y-%m-%d")
        .map_err(|_| format!("{} expects YYYY-MM-DD, got '{}'", flag, value))
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut options = Options {
        config_path: DEFAULT_CONFIG_PATH.to_string(),
        from: None,
        to: None,
        json: false,
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                options.config_path = args.next().ok_or("--config needs a path")?;
            }
            "--from" => options.from = Some(parse_date("--from", args.next())?),
            "--to" => options.to = Some(parse_date("--to", args.next())?),
            "--json" => options.json = true,
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }
    Ok(options)
}

fn window(options: &Options) -> DateWindow {
    let today = Local::now().date_naive();
    match (options.from, options.to) {
        (Some(from), Some(to)) => DateWindow::new(from, to),
        (Some(from), None) => DateWindow::new(from, today),
        (None, Some(to)) => DateWindow::single_day(to),
        (None, None) => DateWindow::single_day(today),
    }
}

fn print_text(report: &RunReport) {
    println!(
        "Alerts for {} to {}",
        report.window.start.format("%d/%m/%Y"),
        report.window.end.format("%d/%m/%Y")
    );
    if report.alerts.is_empty() {
        println!("   No alerts detected");
    }
    for alert in &report.alerts {
        println!(
            "   {:<5} {:<12} {:<28} {}  {}",
            alert.station_type,
            alert.location_id,
            alert.location_name,
            alert.timestamp.format("%d/%m/%Y %H:%M"),
            alert.alert_type()
        );
    }

    for annotated in &report.epan_rain {
        println!(
            "   EPAN {} rain in {}: {}",
            annotated.alert.location_id,
            annotated.alert.project_name,
            annotated.daily_rain_display()
        );
    }

    for day in &report.gate_activity {
        println!(
            "   Gates open at {} on {}: {}",
            day.location_name,
            day.date.format("%d/%m/%Y"),
            day.active_gates.join(", ")
        );
    }

    let low = report.reception.alerts();
    println!(
        "Reception: {} locations, {} below threshold",
        report.reception.summaries.len(),
        low.len()
    );
    for summary in low {
        println!(
            "   {:<20} {:<28} {:>6.2}%  ({}/{}){}",
            summary.project_name,
            summary.location_name,
            summary.percentage,
            summary.data_count,
            summary.expected_data_count,
            summary
                .problem_statement
                .as_ref()
                .map(|p| format!("  {}", p))
                .unwrap_or_default()
        );
    }
    if let (Some(avg_pct), Some(avg_count)) = (
        report.reception.alert_average_percentage(),
        report.reception.alert_average_data_count(),
    ) {
        println!("   Average {:.2}% ({:.2} data points)", avg_pct, avg_count);
    }
    for (band, count) in report.reception.band_counts() {
        println!("   {:>8}: {}", band.label(), count);
    }
}

fn main() -> ExitCode {
    let options = match parse_args(std::env::args().skip(1)) {
        Ok(o) => o,
        Err(msg) => {
            eprintln!("{}", msg);
            eprintln!("Usage: hydromon_service [--config PATH] [--from YYYY-MM-DD --to YYYY-MM-DD] [--json]");
            return ExitCode::from(2);
        }
    };

    // JSON output goes to stdout; keep the console quiet below warnings.
    let floor = if options.json { LogLevel::Warning } else { LogLevel::Info };
    init_logger(floor, None, false);

    let config: AlertConfig = match load_config(&options.config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let level = LogLevel::from_name(&config.log_level).unwrap_or(LogLevel::Info);
    let level = if options.json { level.max(floor) } else { level };
    init_logger(level, config.log_file.as_deref(), false);

    let mut store = match PgReadingStore::from_env() {
        Ok(s) => s,
        Err(e) => {
            logging::error(Component::Store, None, &e.to_string());
            return ExitCode::FAILURE;
        }
    };

    let report = runner::run(&mut store, &config, window(&options));

    if options.json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                logging::error(Component::System, None, &format!("Could not encode report: {}", e));
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_text(&report);
    }
    ExitCode::SUCCESS
}
