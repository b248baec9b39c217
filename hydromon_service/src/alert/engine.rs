//! Alert rule engine.
//!
//! Dispatches each reading to the rule set of its station type and folds
//! the fired triggers into one [`AlertRecord`] per reading. Lookback rules
//! read from per-location [`DailyHistory`] indexes built once per call.
//!
//! Record shape by station type:
//! - EPAN: exactly one trigger, chosen by priority (see [`epan`]).
//! - every other type: low battery first, then all type-specific
//!   triggers that fired, in rule order.

use crate::alert::battery::check_low_battery;
use crate::alert::lookback::{DailyHistory, LocationHistories};
use crate::alert::{epan, gate, level, weather, AlertCategory, AlertRecord, Trigger};
use crate::config::AlertConfig;
use crate::logging::{self, Component};
use crate::model::{Measurements, Reading};

pub struct AlertEngine {
    config: AlertConfig,
}

impl AlertEngine {
    pub fn new(config: AlertConfig) -> Self {
        Self { config }
    }

    /// Evaluates every reading in `readings`, in order, using `history` for
    /// comparisons with earlier days. `history` is normally the full batch
    /// the readings were loaded with.
    pub fn evaluate(&self, readings: &[Reading], history: &[Reading]) -> Vec<AlertRecord> {
        let histories = LocationHistories::new(history);
        let empty = DailyHistory::default();

        let alerts: Vec<AlertRecord> = readings
            .iter()
            .filter_map(|reading| {
                let daily = histories.location(&reading.location_id).unwrap_or(&empty);
                self.evaluate_with(reading, daily)
            })
            .collect();

        logging::debug(
            Component::Engine,
            None,
            &format!(
                "Evaluated {} readings across {} locations: {} alerts",
                readings.len(),
                histories.location_count(),
                alerts.len()
            ),
        );
        alerts
    }

    /// Evaluates a batch that is its own lookback history.
    pub fn evaluate_batch(&self, readings: &[Reading]) -> Vec<AlertRecord> {
        self.evaluate(readings, readings)
    }

    /// Evaluates a single reading against `history`.
    pub fn evaluate_reading(&self, reading: &Reading, history: &[Reading]) -> Option<AlertRecord> {
        let daily = DailyHistory::new(
            history
                .iter()
                .filter(|r| r.location_id == reading.location_id),
        );
        self.evaluate_with(reading, &daily)
    }

    /// Evaluates one batch per station type and concatenates the results in
    /// batch order.
    pub fn evaluate_all(&self, batches: &[Vec<Reading>]) -> Vec<AlertRecord> {
        let alerts: Vec<AlertRecord> = batches
            .iter()
            .flat_map(|batch| self.evaluate_batch(batch))
            .collect();
        logging::info(
            Component::Engine,
            None,
            &format!("{} alerts from {} station batches", alerts.len(), batches.len()),
        );
        alerts
    }

    fn evaluate_with(&self, reading: &Reading, history: &DailyHistory<'_>) -> Option<AlertRecord> {
        let triggers = match &reading.measurements {
            Measurements::Epan(_) => epan::evaluate(reading, history, &self.config)
                .into_iter()
                .collect(),
            Measurements::River(_) | Measurements::Dam(_) => {
                let mut triggers = self.battery(reading);
                triggers.extend(level::evaluate(reading, history, &self.config));
                triggers
            }
            Measurements::Aws(_) => {
                let mut triggers = self.battery(reading);
                triggers.extend(weather::evaluate_aws(reading, &self.config));
                triggers
            }
            Measurements::Ars(_) => {
                let mut triggers = self.battery(reading);
                if self.config.is_enabled(AlertCategory::HeavyRain) {
                    triggers.extend(weather::check_ars_heavy_rain(reading, &self.config.ars));
                }
                triggers
            }
            Measurements::Gate(_) => {
                let mut triggers = self.battery(reading);
                if self.config.is_enabled(AlertCategory::GateOpen) {
                    triggers.extend(gate::check_gate_open(reading, &self.config.gate));
                }
                triggers
            }
        };
        AlertRecord::from_triggers(reading, triggers)
    }

    fn battery(&self, reading: &Reading) -> Vec<Trigger> {
        if !self.config.is_enabled(AlertCategory::LowBattery) {
            return Vec::new();
        }
        check_low_battery(reading, self.config.low_battery_volts)
            .into_iter()
            .collect()
    }
}

impl Default for AlertEngine {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
