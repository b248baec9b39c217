//! Alert detection for station readings.
//!
//! Rules are grouped per station type in the submodules and orchestrated by
//! [`engine::AlertEngine`]. Every rule produces [`Trigger`]s; the engine
//! folds the triggers of one reading into a single [`AlertRecord`].
//!
//! Submodules:
//! - `lookback`: finds comparison values on earlier calendar days.
//! - `battery`, `epan`, `weather`, `level`, `gate`: rule evaluators.
//! - `engine`: per-type rule sets and priority handling.

pub mod battery;
pub mod engine;
pub mod epan;
pub mod gate;
pub mod level;
pub mod lookback;
pub mod weather;

use crate::model::{Reading, StationType};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Display format for comparison dates, matching the station tables.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// The fixed set of alert kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertCategory {
    LowBattery,
    ConstantWaterDepth,
    DepthChange,
    WaterDepthThreshold,
    ZeroReading,
    /// Hourly or daily AWS rain above the heavy-rain threshold.
    HeavyRainfall,
    HighWind,
    /// Legacy AWS `rainfall` column above its own threshold.
    HighRainfall,
    HighTemperature,
    LevelChange,
    ExtremeLevel,
    GateOpen,
    /// ARS hourly or daily rain above the heavy-rain threshold.
    HeavyRain,
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ---------------------------------------------------------------------------
// Triggers
// ---------------------------------------------------------------------------

/// Comparison against the nearest earlier day with data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorComparison {
    pub previous_value: f64,
    pub comparison_date: NaiveDate,
    /// Absolute difference between the current and previous value.
    pub difference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TriggerContext {
    Prior(PriorComparison),
    /// Days whose value matched the current one, most recent first.
    ConstantDays(Vec<NaiveDate>),
    /// Columns that crossed a shared threshold.
    Columns(Vec<String>),
}

/// One fired condition on one reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub category: AlertCategory,
    /// Column the condition was evaluated on.
    pub field: String,
    pub value: f64,
    pub threshold: f64,
    pub label: String,
    pub context: Option<TriggerContext>,
}

impl Trigger {
    pub fn new(category: AlertCategory, field: &str, value: f64, threshold: f64, label: String) -> Self {
        Self {
            category,
            field: field.to_string(),
            value,
            threshold,
            label,
            context: None,
        }
    }

    pub fn with_context(mut self, context: TriggerContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn prior(&self) -> Option<&PriorComparison> {
        match &self.context {
            Some(TriggerContext::Prior(p)) => Some(p),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Alert output for one reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub station_type: StationType,
    pub location_id: String,
    pub location_name: String,
    pub project_name: String,
    pub timestamp: NaiveDateTime,
    pub triggers: Vec<Trigger>,
}

impl AlertRecord {
    /// Builds a record from the triggers fired on `reading`, or `None` when
    /// nothing fired.
    pub fn from_triggers(reading: &Reading, triggers: Vec<Trigger>) -> Option<Self> {
        if triggers.is_empty() {
            return None;
        }
        Some(Self {
            station_type: reading.station_type(),
            location_id: reading.location_id.clone(),
            location_name: reading.location_name.clone(),
            project_name: reading.project_name.clone(),
            timestamp: reading.timestamp,
            triggers,
        })
    }

    pub fn categories(&self) -> Vec<AlertCategory> {
        self.triggers.iter().map(|t| t.category).collect()
    }

    pub fn has(&self, category: AlertCategory) -> bool {
        self.triggers.iter().any(|t| t.category == category)
    }

    pub fn trigger(&self, category: AlertCategory) -> Option<&Trigger> {
        self.triggers.iter().find(|t| t.category == category)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.triggers.iter().map(|t| t.label.as_str()).collect()
    }

    /// All labels joined for single-column display.
    pub fn alert_type(&self) -> String {
        self.labels().join(", ")
    }
}

/// Formats a comparison date the way the station tables write dates.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EpanFields, Measurements, RawValue};

    fn reading() -> Reading {
        Reading {
            location_id: "L1".into(),
            location_name: "Pan 1".into(),
            project_name: "Godavari".into(),
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 10)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            batt_volt: Some(RawValue::Number(12.0)),
            measurements: Measurements::Epan(EpanFields::default()),
        }
    }

    #[test]
    fn test_no_triggers_means_no_record() {
        assert!(AlertRecord::from_triggers(&reading(), Vec::new()).is_none());
    }

    #[test]
    fn test_alert_type_joins_labels_in_order() {
        let triggers = vec![
            Trigger::new(AlertCategory::ZeroReading, "temperature", 0.0, 0.0, "Temperature is 0".into()),
            Trigger::new(AlertCategory::HighWind, "wind_speed", 35.0, 30.0, "High Wind Speed (>30)".into()),
        ];
        let record = AlertRecord::from_triggers(&reading(), triggers).expect("record");
        assert_eq!(record.alert_type(), "Temperature is 0, High Wind Speed (>30)");
        assert_eq!(
            record.categories(),
            vec![AlertCategory::ZeroReading, AlertCategory::HighWind]
        );
        assert_eq!(record.station_type, StationType::Epan);
    }

    #[test]
    fn test_format_date_uses_day_first() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        assert_eq!(format_date(d), "09/01/2024");
    }
}
