//! Station type registry for the telemetry dashboard.
//!
//! Defines the canonical list of station types monitored by this service,
//! along with the table each type is stored in and the measurement columns
//! each type is expected to report. This is the single source of truth for table names; all
//! other modules should reference station types from here rather than
//! hardcoding them.

use crate::model::{
    StationType, FIELD_ATMOSPHERIC_PRESSURE, FIELD_DAILY_RAIN, FIELD_EPAN_WATER_DEPTH,
    FIELD_HOURLY_RAIN, FIELD_HUMIDITY, FIELD_LEVEL_MTR, FIELD_RAINFALL, FIELD_SOLAR_RADIATION,
    FIELD_TEMPERATURE, FIELD_WIND_SPEED,
};

/// Status-tracking feed used by the reception-rate evaluator.
pub const STATUS_TABLE: &str = "nhpmh_data";

/// Columns every station table carries.
pub const COMMON_COLUMNS: &[&str] = &[
    "location_id",
    "location_name",
    "project_name",
    "last_updated",
    "batt_volt",
];

// ---------------------------------------------------------------------------
// Station type metadata
// ---------------------------------------------------------------------------

/// Metadata for a single station type.
pub struct StationInfo {
    pub station_type: StationType,
    /// Data table holding this type's readings.
    pub table: &'static str,
    /// Measurement columns beyond [`COMMON_COLUMNS`]. Gate tables have
    /// dynamic `g<N>` columns and list none here.
    pub measurement_columns: &'static [&'static str],
}

/// All station types monitored by the dashboard.
pub static STATION_REGISTRY: &[StationInfo] = &[
    StationInfo {
        station_type: StationType::River,
        table: "river_data",
        measurement_columns: &[FIELD_LEVEL_MTR],
    },
    StationInfo {
        station_type: StationType::Dam,
        table: "dam_data",
        measurement_columns: &[FIELD_LEVEL_MTR],
    },
    StationInfo {
        station_type: StationType::Epan,
        table: "epan_data",
        measurement_columns: &[FIELD_EPAN_WATER_DEPTH],
    },
    StationInfo {
        station_type: StationType::Aws,
        table: "aws_data",
        measurement_columns: &[
            FIELD_ATMOSPHERIC_PRESSURE,
            FIELD_TEMPERATURE,
            FIELD_HUMIDITY,
            FIELD_SOLAR_RADIATION,
            FIELD_WIND_SPEED,
            FIELD_HOURLY_RAIN,
            FIELD_DAILY_RAIN,
            FIELD_RAINFALL,
        ],
    },
    StationInfo {
        station_type: StationType::Ars,
        table: "ars_data",
        measurement_columns: &[FIELD_HOURLY_RAIN, FIELD_DAILY_RAIN],
    },
    StationInfo {
        station_type: StationType::Gate,
        table: "gate_data",
        measurement_columns: &[],
    },
];

/// Looks up a station type's metadata. Every [`StationType`] is registered.
pub fn station_info(station_type: StationType) -> &'static StationInfo {
    STATION_REGISTRY
        .iter()
        .find(|s| s.station_type == station_type)
        .unwrap_or(&STATION_REGISTRY[0])
}

/// Returns the data table for a station type.
pub fn table_for(station_type: StationType) -> &'static str {
    station_info(station_type).table
}

/// Expected columns of a station type that are absent from `columns`.
///
/// Gate channels are dynamic and never reported missing.
pub fn missing_columns<'a, I>(station_type: StationType, columns: I) -> Vec<&'static str>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: Vec<&str> = columns.into_iter().collect();
    COMMON_COLUMNS
        .iter()
        .chain(station_info(station_type).measurement_columns)
        .copied()
        .filter(|c| !present.contains(c))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_station_type_is_registered_once() {
        for station_type in StationType::ALL {
            let count = STATION_REGISTRY
                .iter()
                .filter(|s| s.station_type == station_type)
                .count();
            assert_eq!(count, 1, "{} should be registered exactly once", station_type);
        }
        assert_eq!(STATION_REGISTRY.len(), StationType::ALL.len());
    }

    #[test]
    fn test_no_duplicate_tables() {
        let mut tables = std::collections::HashSet::new();
        for station in STATION_REGISTRY {
            assert!(tables.insert(station.table), "duplicate table '{}'", station.table);
        }
    }

    #[test]
    fn test_table_names_match_dashboard_sources() {
        assert_eq!(table_for(StationType::River), "river_data");
        assert_eq!(table_for(StationType::Dam), "dam_data");
        assert_eq!(table_for(StationType::Epan), "epan_data");
        assert_eq!(table_for(StationType::Aws), "aws_data");
        assert_eq!(table_for(StationType::Ars), "ars_data");
        assert_eq!(table_for(StationType::Gate), "gate_data");
    }

    #[test]
    fn test_missing_columns_reports_schema_drift() {
        let full = [
            "location_id",
            "location_name",
            "project_name",
            "last_updated",
            "batt_volt",
            FIELD_EPAN_WATER_DEPTH,
        ];
        assert!(missing_columns(StationType::Epan, full).is_empty());

        let renamed = ["location_id", "last_updated", "batt_volt", "water_depth"];
        assert_eq!(
            missing_columns(StationType::Epan, renamed),
            vec!["location_name", "project_name", FIELD_EPAN_WATER_DEPTH]
        );
    }

    #[test]
    fn test_gate_channels_are_never_missing() {
        let cols = ["location_id", "location_name", "project_name", "last_updated", "batt_volt"];
        assert!(missing_columns(StationType::Gate, cols).is_empty());
        assert_eq!(
            missing_columns(StationType::Aws, cols),
            vec![
                FIELD_ATMOSPHERIC_PRESSURE,
                FIELD_TEMPERATURE,
                FIELD_HUMIDITY,
                FIELD_SOLAR_RADIATION,
                FIELD_WIND_SPEED,
                FIELD_HOURLY_RAIN,
                FIELD_DAILY_RAIN,
                FIELD_RAINFALL,
            ]
        );
    }

    #[test]
    fn test_table_names_are_safe_identifiers() {
        // Table names are interpolated into SQL by the store.
        for station in STATION_REGISTRY {
            assert!(
                station.table.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "table name '{}' must be a plain identifier",
                station.table
            );
        }
    }
}
