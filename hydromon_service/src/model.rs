//! Core data types for the hydrological station monitoring service.
//!
//! This module defines the shared domain model imported by all other
//! modules: station types, readings with their per-type measurement sets,
//! the status-feed rows used for reception tracking, and the error type
//! produced when raw rows cannot be turned into readings.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Station types
// ---------------------------------------------------------------------------

/// Category of monitoring point. Each type reports its own measurement set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StationType {
    River,
    Dam,
    #[serde(rename = "EPAN")]
    Epan,
    #[serde(rename = "AWS")]
    Aws,
    #[serde(rename = "ARS")]
    Ars,
    Gate,
}

impl StationType {
    pub const ALL: [StationType; 6] = [
        StationType::River,
        StationType::Dam,
        StationType::Epan,
        StationType::Aws,
        StationType::Ars,
        StationType::Gate,
    ];

    /// Parses the short names used throughout the dashboard ("EPAN", "river", ...).
    pub fn from_name(name: &str) -> Result<Self, ReadingError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "river" => Ok(StationType::River),
            "dam" => Ok(StationType::Dam),
            "epan" => Ok(StationType::Epan),
            "aws" => Ok(StationType::Aws),
            "ars" => Ok(StationType::Ars),
            "gate" => Ok(StationType::Gate),
            _ => Err(ReadingError::UnknownStationType(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StationType::River => "River",
            StationType::Dam => "Dam",
            StationType::Epan => "EPAN",
            StationType::Aws => "AWS",
            StationType::Ars => "ARS",
            StationType::Gate => "Gate",
        }
    }
}

impl fmt::Display for StationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Raw values
// ---------------------------------------------------------------------------

/// A measurement value as delivered by the store.
///
/// Station tables are loosely typed (many columns are VARCHAR), so a value
/// may arrive as a number or as text. Numeric coercion is deferred to the
/// rules via [`RawValue::as_f64`]; a value that does not coerce is treated
/// as absent by the check that asked for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Returns the value as a finite number, or `None` if it does not coerce.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            RawValue::Number(n) => *n,
            RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// An optional raw measurement column.
pub type Field = Option<RawValue>;

/// Coerces an optional raw column to a number.
pub fn numeric(field: &Field) -> Option<f64> {
    field.as_ref().and_then(RawValue::as_f64)
}

// ---------------------------------------------------------------------------
// Measurement sets
// ---------------------------------------------------------------------------

pub const FIELD_BATT_VOLT: &str = "batt_volt";
pub const FIELD_LEVEL_MTR: &str = "level_mtr";
pub const FIELD_EPAN_WATER_DEPTH: &str = "epan_water_depth";
pub const FIELD_ATMOSPHERIC_PRESSURE: &str = "atmospheric_pressure";
pub const FIELD_TEMPERATURE: &str = "temperature";
pub const FIELD_HUMIDITY: &str = "humidity";
pub const FIELD_SOLAR_RADIATION: &str = "solar_radiation";
pub const FIELD_WIND_SPEED: &str = "wind_speed";
pub const FIELD_HOURLY_RAIN: &str = "hourly_rain";
pub const FIELD_DAILY_RAIN: &str = "daily_rain";
pub const FIELD_RAINFALL: &str = "rainfall";

/// River and Dam stations report a water level in metres.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelFields {
    pub level_mtr: Field,
}

/// Evaporation pan water depth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpanFields {
    pub epan_water_depth: Field,
}

/// Automatic weather station channels.
///
/// `rainfall` is a legacy column kept separate from the hourly/daily
/// accumulations; older AWS tables still carry it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AwsFields {
    pub atmospheric_pressure: Field,
    pub temperature: Field,
    pub humidity: Field,
    pub solar_radiation: Field,
    pub wind_speed: Field,
    pub hourly_rain: Field,
    pub daily_rain: Field,
    pub rainfall: Field,
}

/// Automatic rain-gauge accumulations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RainFields {
    pub hourly_rain: Field,
    pub daily_rain: Field,
}

/// One gate opening channel, named `g<number>` in the source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateChannel {
    pub name: String,
    pub number: u32,
    pub value: Field,
}

impl GateChannel {
    /// Parses a column name of the form `g<digits>` into its channel number.
    pub fn parse_name(column: &str) -> Option<u32> {
        let digits = column.strip_prefix('g')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

/// Gate stations carry a variable number of gate channels, ordered by
/// channel number ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GateFields {
    pub gates: Vec<GateChannel>,
}

/// Station-type specific measurements. The variant determines the
/// reading's station type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Measurements {
    River(LevelFields),
    Dam(LevelFields),
    Epan(EpanFields),
    Aws(AwsFields),
    Ars(RainFields),
    Gate(GateFields),
}

impl Measurements {
    pub fn station_type(&self) -> StationType {
        match self {
            Measurements::River(_) => StationType::River,
            Measurements::Dam(_) => StationType::Dam,
            Measurements::Epan(_) => StationType::Epan,
            Measurements::Aws(_) => StationType::Aws,
            Measurements::Ars(_) => StationType::Ars,
            Measurements::Gate(_) => StationType::Gate,
        }
    }

    /// Looks up a measurement column by its table name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        match self {
            Measurements::River(f) | Measurements::Dam(f) => match name {
                FIELD_LEVEL_MTR => Some(&f.level_mtr),
                _ => None,
            },
            Measurements::Epan(f) => match name {
                FIELD_EPAN_WATER_DEPTH => Some(&f.epan_water_depth),
                _ => None,
            },
            Measurements::Aws(f) => match name {
                FIELD_ATMOSPHERIC_PRESSURE => Some(&f.atmospheric_pressure),
                FIELD_TEMPERATURE => Some(&f.temperature),
                FIELD_HUMIDITY => Some(&f.humidity),
                FIELD_SOLAR_RADIATION => Some(&f.solar_radiation),
                FIELD_WIND_SPEED => Some(&f.wind_speed),
                FIELD_HOURLY_RAIN => Some(&f.hourly_rain),
                FIELD_DAILY_RAIN => Some(&f.daily_rain),
                FIELD_RAINFALL => Some(&f.rainfall),
                _ => None,
            },
            Measurements::Ars(f) => match name {
                FIELD_HOURLY_RAIN => Some(&f.hourly_rain),
                FIELD_DAILY_RAIN => Some(&f.daily_rain),
                _ => None,
            },
            Measurements::Gate(f) => f.gates.iter().find(|g| g.name == name).map(|g| &g.value),
        }
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// One sensor sample from a station table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub location_id: String,
    pub location_name: String,
    pub project_name: String,
    pub timestamp: NaiveDateTime,
    pub batt_volt: Field,
    pub measurements: Measurements,
}

impl Reading {
    pub fn station_type(&self) -> StationType {
        self.measurements.station_type()
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Numeric value of a named column, including the shared `batt_volt`.
    /// Returns `None` when the column does not exist for this station type
    /// or its value does not coerce to a number.
    pub fn value(&self, field: &str) -> Option<f64> {
        if field == FIELD_BATT_VOLT {
            return numeric(&self.batt_volt);
        }
        self.measurements.field(field).and_then(numeric)
    }
}

// ---------------------------------------------------------------------------
// Status feed
// ---------------------------------------------------------------------------

/// One row of the status-tracking feed (`nhpmh_data`), pre-aggregated to
/// an hourly `data_count`. `sr_no` restarts at 1 for every report section.
///
/// `last_updated` is `None` when the feed's timestamp could not be parsed.
/// Such a row still marks section boundaries and carries its count, but
/// takes no part in dating the section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRow {
    pub sr_no: i64,
    pub last_updated: Option<NaiveDateTime>,
    pub project_name: String,
    pub location_name: String,
    pub location_id: String,
    pub location_type: Option<String>,
    pub problem_statement: Option<String>,
    pub data_count: Option<f64>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when turning raw store rows into readings.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadingError {
    /// The row's timestamp column could not be parsed.
    InvalidTimestamp(String),
    /// A column every row must carry is missing or empty.
    MissingColumn(&'static str),
    /// The station type name is not one of the known types.
    UnknownStationType(String),
    /// The row was not a JSON object.
    NotAnObject,
}

impl fmt::Display for ReadingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadingError::InvalidTimestamp(raw) => write!(f, "Invalid timestamp: '{}'", raw),
            ReadingError::MissingColumn(col) => write!(f, "Missing column: {}", col),
            ReadingError::UnknownStationType(name) => write!(f, "Unknown station type: {}", name),
            ReadingError::NotAnObject => write!(f, "Row is not an object"),
        }
    }
}

impl std::error::Error for ReadingError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
