//! One monitoring pass over a reading store.
//!
//! Each station type is fetched with enough days before the requested
//! window for the lookback rules, then only the readings inside the window
//! are evaluated. A failing station table is logged and skipped so that
//! one missing table does not hide alerts from the others.

use crate::alert::engine::AlertEngine;
use crate::alert::AlertRecord;
use crate::analysis::gates::{daily_gate_activity, GateDay};
use crate::analysis::rain::{annotate_epan_alerts, RainAnnotatedAlert};
use crate::config::AlertConfig;
use crate::logging::{self, Component};
use crate::model::{Reading, StationType};
use crate::reception::{self, DateWindow, ReceptionReport};
use crate::store::{ReadingQuery, ReadingStore};
use chrono::Days;
use serde::Serialize;

/// Everything one pass produces.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub window: DateWindow,
    pub alerts: Vec<AlertRecord>,
    pub reception: ReceptionReport,
    pub gate_activity: Vec<GateDay>,
    pub epan_rain: Vec<RainAnnotatedAlert>,
    /// Station types whose table could not be read.
    pub failed_station_types: Vec<StationType>,
}

impl RunReport {
    pub fn has_alerts(&self) -> bool {
        !self.alerts.is_empty() || !self.reception.alerts().is_empty()
    }
}

/// The window widened backwards by the deepest lookback any rule uses.
pub fn history_window(window: DateWindow, config: &AlertConfig) -> DateWindow {
    let depth = config
        .epan
        .lookback_days
        .max(config.epan.constant_days)
        .max(config.level.lookback_days);
    let start = window
        .start
        .checked_sub_days(Days::new(u64::from(depth)))
        .unwrap_or(window.start);
    DateWindow::new(start, window.end)
}

fn fetch_batch(
    store: &mut dyn ReadingStore,
    station_type: StationType,
    query: &ReadingQuery,
    failed: &mut Vec<StationType>,
) -> Vec<Reading> {
    match store.fetch_readings(station_type, query) {
        Ok(batch) => batch,
        Err(e) => {
            logging::error(
                Component::System,
                None,
                &format!("{} readings unavailable, evaluating as empty: {}", station_type, e),
            );
            failed.push(station_type);
            Vec::new()
        }
    }
}

/// Runs alert detection, reception and the supplementary views for
/// `window`.
pub fn run(store: &mut dyn ReadingStore, config: &AlertConfig, window: DateWindow) -> RunReport {
    let engine = AlertEngine::new(config.clone());
    let query = ReadingQuery::with_limit(config.row_limit).window(history_window(window, config));

    let mut failed = Vec::new();
    let mut alerts = Vec::new();
    let mut aws_batch = Vec::new();
    let mut gate_current = Vec::new();

    for station_type in StationType::ALL {
        let batch = fetch_batch(store, station_type, &query, &mut failed);
        let current: Vec<Reading> = batch
            .iter()
            .filter(|r| window.contains(r.date()))
            .cloned()
            .collect();

        let found = engine.evaluate(&current, &batch);
        logging::info(
            Component::Engine,
            None,
            &format!("{}: {} readings in window, {} alerts", station_type, current.len(), found.len()),
        );
        alerts.extend(found);

        match station_type {
            StationType::Aws => aws_batch = batch,
            StationType::Gate => gate_current = current,
            _ => {}
        }
    }

    let epan_rain = annotate_epan_alerts(&alerts, &aws_batch);
    let gate_activity = daily_gate_activity(&gate_current);

    let status_rows = match store.fetch_status_rows(&ReadingQuery::with_limit(config.row_limit)) {
        Ok(rows) => rows,
        Err(e) => {
            logging::error(
                Component::Reception,
                None,
                &format!("Status feed unavailable: {}", e),
            );
            Vec::new()
        }
    };
    let reception = reception::evaluate(&status_rows, window, &config.reception);

    RunReport {
        window,
        alerts,
        reception,
        gate_activity,
        epan_rain,
        failed_station_types: failed,
    }
}
