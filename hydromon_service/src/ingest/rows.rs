/// Row adapter: JSON objects from the station tables to [`Reading`]s.
///
/// The store hands over each table row as a JSON object keyed by column
/// name. Rows that cannot become a reading (bad timestamp, missing
/// identity columns) are logged at debug level and dropped; a summary per
/// table is logged once the batch is converted. Measurement values are
/// kept raw so that an unparseable value only disables the checks that
/// need it.

use crate::logging::{self, Component};
use crate::model::{
    AwsFields, EpanFields, Field, GateChannel, GateFields, LevelFields, Measurements, RainFields,
    RawValue, Reading, ReadingError, StationType, StatusRow, FIELD_ATMOSPHERIC_PRESSURE,
    FIELD_BATT_VOLT, FIELD_DAILY_RAIN, FIELD_EPAN_WATER_DEPTH, FIELD_HOURLY_RAIN, FIELD_HUMIDITY,
    FIELD_LEVEL_MTR, FIELD_RAINFALL, FIELD_SOLAR_RADIATION, FIELD_TEMPERATURE, FIELD_WIND_SPEED,
};
use crate::stations::{missing_columns, table_for, STATUS_TABLE};
use chrono::NaiveDateTime;
use serde_json::{Map, Value};

/// Timestamp format written by the station loggers.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Formats also seen when a column is a native timestamp serialized by
/// the database.
const FALLBACK_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const COL_LOCATION_ID: &str = "location_id";
const COL_LOCATION_NAME: &str = "location_name";
const COL_PROJECT_NAME: &str = "project_name";
const COL_LAST_UPDATED: &str = "last_updated";

// ---------------------------------------------------------------------------
// Column helpers
// ---------------------------------------------------------------------------

/// Parses a `last_updated` value.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, ReadingError> {
    let trimmed = raw.trim();
    std::iter::once(TIMESTAMP_FORMAT)
        .chain(FALLBACK_FORMATS.iter().copied())
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| ReadingError::InvalidTimestamp(raw.to_string()))
}

/// A JSON cell as a raw measurement. Null, booleans and nested values are
/// treated as absent.
pub fn raw_value(value: &Value) -> Field {
    match value {
        Value::Number(n) => n.as_f64().map(RawValue::Number),
        Value::String(s) => Some(RawValue::Text(s.clone())),
        _ => None,
    }
}

fn field(row: &Map<String, Value>, column: &str) -> Field {
    row.get(column).and_then(raw_value)
}

/// Identity columns may be stored as text or as integers.
fn text(row: &Map<String, Value>, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required_text(row: &Map<String, Value>, column: &'static str) -> Result<String, ReadingError> {
    text(row, column).ok_or(ReadingError::MissingColumn(column))
}

fn timestamp(row: &Map<String, Value>) -> Result<NaiveDateTime, ReadingError> {
    match row.get(COL_LAST_UPDATED) {
        Some(Value::String(s)) => parse_timestamp(s),
        Some(Value::Null) | None => Err(ReadingError::MissingColumn(COL_LAST_UPDATED)),
        Some(other) => Err(ReadingError::InvalidTimestamp(other.to_string())),
    }
}

/// `g<N>` columns of a gate row, ascending by channel number.
fn gate_channels(row: &Map<String, Value>) -> Vec<GateChannel> {
    let mut gates: Vec<GateChannel> = row
        .iter()
        .filter_map(|(column, value)| {
            let number = GateChannel::parse_name(column)?;
            Some(GateChannel {
                name: column.clone(),
                number,
                value: raw_value(value),
            })
        })
        .collect();
    gates.sort_by_key(|g| g.number);
    gates
}

fn measurements(station_type: StationType, row: &Map<String, Value>) -> Measurements {
    match station_type {
        StationType::River => Measurements::River(LevelFields {
            level_mtr: field(row, FIELD_LEVEL_MTR),
        }),
        StationType::Dam => Measurements::Dam(LevelFields {
            level_mtr: field(row, FIELD_LEVEL_MTR),
        }),
        StationType::Epan => Measurements::Epan(EpanFields {
            epan_water_depth: field(row, FIELD_EPAN_WATER_DEPTH),
        }),
        StationType::Aws => Measurements::Aws(AwsFields {
            atmospheric_pressure: field(row, FIELD_ATMOSPHERIC_PRESSURE),
            temperature: field(row, FIELD_TEMPERATURE),
            humidity: field(row, FIELD_HUMIDITY),
            solar_radiation: field(row, FIELD_SOLAR_RADIATION),
            wind_speed: field(row, FIELD_WIND_SPEED),
            hourly_rain: field(row, FIELD_HOURLY_RAIN),
            daily_rain: field(row, FIELD_DAILY_RAIN),
            rainfall: field(row, FIELD_RAINFALL),
        }),
        StationType::Ars => Measurements::Ars(RainFields {
            hourly_rain: field(row, FIELD_HOURLY_RAIN),
            daily_rain: field(row, FIELD_DAILY_RAIN),
        }),
        StationType::Gate => Measurements::Gate(GateFields {
            gates: gate_channels(row),
        }),
    }
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// Converts one station table row.
pub fn reading_from_row(station_type: StationType, row: &Value) -> Result<Reading, ReadingError> {
    let row = row.as_object().ok_or(ReadingError::NotAnObject)?;
    Ok(Reading {
        location_id: required_text(row, COL_LOCATION_ID)?,
        location_name: text(row, COL_LOCATION_NAME).unwrap_or_default(),
        project_name: text(row, COL_PROJECT_NAME).unwrap_or_default(),
        timestamp: timestamp(row)?,
        batt_volt: field(row, FIELD_BATT_VOLT),
        measurements: measurements(station_type, row),
    })
}

/// Expected columns absent from the first row of a batch, if any.
pub fn schema_drift(station_type: StationType, rows: &[Value]) -> Option<Vec<&'static str>> {
    let first = rows.first()?.as_object()?;
    let missing = missing_columns(station_type, first.keys().map(String::as_str));
    (!missing.is_empty()).then_some(missing)
}

/// Converts a batch of rows, dropping the ones that cannot be read.
/// Order of the surviving rows is preserved.
pub fn readings_from_rows(station_type: StationType, rows: &[Value]) -> Vec<Reading> {
    let table = table_for(station_type);
    let mut readings = Vec::with_capacity(rows.len());

    if let Some(missing) = schema_drift(station_type, rows) {
        logging::warn(
            Component::Ingest,
            None,
            &format!("{} rows lack expected columns: {}", table, missing.join(", ")),
        );
    }

    for row in rows {
        match reading_from_row(station_type, row) {
            Ok(reading) => readings.push(reading),
            Err(e) => {
                let location = row.get(COL_LOCATION_ID).map(|v| v.to_string());
                logging::debug(
                    Component::Ingest,
                    location.as_deref(),
                    &format!("Dropping {} row: {}", table, e),
                );
            }
        }
    }

    logging::log_ingest_summary(table, rows.len(), readings.len(), rows.len() - readings.len());
    readings
}

// ---------------------------------------------------------------------------
// Status feed
// ---------------------------------------------------------------------------

fn sr_no(row: &Map<String, Value>) -> Result<i64, ReadingError> {
    let parsed = match row.get("sr_no") {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or(ReadingError::MissingColumn("sr_no"))
}

/// Converts one `nhpmh_data` row.
///
/// An unreadable `last_updated` does not reject the row: the row still
/// delimits its report section and contributes its count.
pub fn status_row_from_json(row: &Value) -> Result<StatusRow, ReadingError> {
    let row = row.as_object().ok_or(ReadingError::NotAnObject)?;
    let last_updated = match timestamp(row) {
        Ok(ts) => Some(ts),
        Err(e) => {
            logging::debug(
                Component::Ingest,
                text(row, COL_LOCATION_ID).as_deref(),
                &format!("{} row without a usable timestamp: {}", STATUS_TABLE, e),
            );
            None
        }
    };
    Ok(StatusRow {
        sr_no: sr_no(row)?,
        last_updated,
        project_name: text(row, COL_PROJECT_NAME).unwrap_or_default(),
        location_name: text(row, COL_LOCATION_NAME).unwrap_or_default(),
        location_id: required_text(row, COL_LOCATION_ID)?,
        location_type: text(row, "location_type"),
        problem_statement: text(row, "problem_statement"),
        data_count: field(row, "data_count").and_then(|v| v.as_f64()),
    })
}

/// Converts a batch of status rows, dropping unreadable ones.
pub fn status_rows_from_json(rows: &[Value]) -> Vec<StatusRow> {
    let mut parsed = Vec::with_capacity(rows.len());
    for row in rows {
        match status_row_from_json(row) {
            Ok(status) => parsed.push(status),
            Err(e) => logging::debug(
                Component::Ingest,
                None,
                &format!("Dropping {} row: {}", STATUS_TABLE, e),
            ),
        }
    }
    logging::log_ingest_summary(STATUS_TABLE, rows.len(), parsed.len(), rows.len() - parsed.len());
    parsed
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
