//! Weather rules for automatic weather stations (AWS) and rain gauges (ARS).
//!
//! AWS conditions are not mutually exclusive: every check that fires is
//! reported, and the engine folds them into one record per reading.

use crate::alert::{AlertCategory, Trigger, TriggerContext};
use crate::config::{AlertConfig, ArsConfig, AwsConfig};
use crate::model::{
    Reading, FIELD_ATMOSPHERIC_PRESSURE, FIELD_DAILY_RAIN, FIELD_HOURLY_RAIN, FIELD_HUMIDITY,
    FIELD_RAINFALL, FIELD_SOLAR_RADIATION, FIELD_TEMPERATURE, FIELD_WIND_SPEED,
};

/// Channels that should never read exactly zero on a healthy sensor.
pub const ZERO_CHECK_FIELDS: [&str; 5] = [
    FIELD_ATMOSPHERIC_PRESSURE,
    FIELD_TEMPERATURE,
    FIELD_HUMIDITY,
    FIELD_SOLAR_RADIATION,
    FIELD_WIND_SPEED,
];

const RAIN_FIELDS: [&str; 2] = [FIELD_HOURLY_RAIN, FIELD_DAILY_RAIN];

/// "solar_radiation" -> "Solar radiation"
fn display_name(field: &str) -> String {
    let spaced = field.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One trigger per zero-check channel that reads exactly 0.
pub fn check_zero_readings(reading: &Reading) -> Vec<Trigger> {
    ZERO_CHECK_FIELDS
        .iter()
        .filter_map(|field| {
            let value = reading.value(field)?;
            (value == 0.0).then(|| {
                Trigger::new(
                    AlertCategory::ZeroReading,
                    field,
                    value,
                    0.0,
                    format!("{} is 0", display_name(field)),
                )
            })
        })
        .collect()
}

/// Hourly and daily rain are checked independently; either one above the
/// threshold fires a single trigger listing every column that crossed it.
fn check_rain_columns(
    reading: &Reading,
    threshold: f64,
    category: AlertCategory,
    label: String,
) -> Option<Trigger> {
    let crossed: Vec<(&str, f64)> = RAIN_FIELDS
        .iter()
        .filter_map(|field| reading.value(field).map(|v| (*field, v)))
        .filter(|(_, v)| *v > threshold)
        .collect();
    let (first_field, first_value) = *crossed.first()?;
    let columns = crossed.iter().map(|(f, _)| f.to_string()).collect();
    Some(
        Trigger::new(category, first_field, first_value, threshold, label)
            .with_context(TriggerContext::Columns(columns)),
    )
}

pub fn check_heavy_rainfall(reading: &Reading, config: &AwsConfig) -> Option<Trigger> {
    check_rain_columns(
        reading,
        config.heavy_rain_mm,
        AlertCategory::HeavyRainfall,
        format!("Rainfall > {}mm", config.heavy_rain_mm),
    )
}

pub fn check_high_wind(reading: &Reading, config: &AwsConfig) -> Option<Trigger> {
    let speed = reading.value(FIELD_WIND_SPEED)?;
    (speed > config.high_wind).then(|| {
        Trigger::new(
            AlertCategory::HighWind,
            FIELD_WIND_SPEED,
            speed,
            config.high_wind,
            format!("High Wind Speed (>{})", config.high_wind),
        )
    })
}

pub fn check_legacy_rainfall(reading: &Reading, config: &AwsConfig) -> Option<Trigger> {
    let rainfall = reading.value(FIELD_RAINFALL)?;
    (rainfall > config.legacy_rainfall_mm).then(|| {
        Trigger::new(
            AlertCategory::HighRainfall,
            FIELD_RAINFALL,
            rainfall,
            config.legacy_rainfall_mm,
            format!("High Rainfall (>{}mm)", config.legacy_rainfall_mm),
        )
    })
}

pub fn check_high_temperature(reading: &Reading, config: &AwsConfig) -> Option<Trigger> {
    let temperature = reading.value(FIELD_TEMPERATURE)?;
    (temperature > config.high_temperature).then(|| {
        Trigger::new(
            AlertCategory::HighTemperature,
            FIELD_TEMPERATURE,
            temperature,
            config.high_temperature,
            format!("High Temperature (>{})", config.high_temperature),
        )
    })
}

/// All AWS conditions that fire, in reporting order.
pub fn evaluate_aws(reading: &Reading, config: &AlertConfig) -> Vec<Trigger> {
    let aws = &config.aws;
    let mut triggers = Vec::new();

    if config.is_enabled(AlertCategory::ZeroReading) {
        triggers.extend(check_zero_readings(reading));
    }
    if config.is_enabled(AlertCategory::HeavyRainfall) {
        triggers.extend(check_heavy_rainfall(reading, aws));
    }
    if config.is_enabled(AlertCategory::HighWind) {
        triggers.extend(check_high_wind(reading, aws));
    }
    if config.is_enabled(AlertCategory::HighRainfall) {
        triggers.extend(check_legacy_rainfall(reading, aws));
    }
    if config.is_enabled(AlertCategory::HighTemperature) {
        triggers.extend(check_high_temperature(reading, aws));
    }
    triggers
}

/// ARS heavy rain: daily or hourly accumulation above the threshold.
pub fn check_ars_heavy_rain(reading: &Reading, config: &ArsConfig) -> Option<Trigger> {
    check_rain_columns(
        reading,
        config.heavy_rain_mm,
        AlertCategory::HeavyRain,
        format!("Heavy Rain (>{}mm)", config.heavy_rain_mm),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AwsFields, Measurements, RainFields, RawValue};
    use chrono::NaiveDate;

    fn n(v: f64) -> Option<RawValue> {
        Some(RawValue::Number(v))
    }

    fn aws(fields: AwsFields) -> Reading {
        Reading {
            location_id: "W1".into(),
            location_name: "Weather 1".into(),
            project_name: "Tapi".into(),
            timestamp: NaiveDate::from_ymd_opt(2024, 7, 3).unwrap().and_hms_opt(14, 0, 0).unwrap(),
            batt_volt: n(12.4),
            measurements: Measurements::Aws(fields),
        }
    }

    fn healthy() -> AwsFields {
        AwsFields {
            atmospheric_pressure: n(1008.0),
            temperature: n(28.0),
            humidity: n(60.0),
            solar_radiation: n(450.0),
            wind_speed: n(12.0),
            hourly_rain: n(2.0),
            daily_rain: n(20.0),
            rainfall: None,
        }
    }

    fn labels(triggers: &[Trigger]) -> Vec<&str> {
        triggers.iter().map(|t| t.label.as_str()).collect()
    }

    #[test]
    fn test_healthy_station_fires_nothing() {
        assert!(evaluate_aws(&aws(healthy()), &AlertConfig::default()).is_empty());
    }

    #[test]
    fn test_zero_temperature_and_high_wind_accumulate() {
        let mut f = healthy();
        f.temperature = n(0.0);
        f.wind_speed = n(35.0);
        let triggers = evaluate_aws(&aws(f), &AlertConfig::default());
        assert_eq!(labels(&triggers), vec!["Temperature is 0", "High Wind Speed (>30)"]);
    }

    #[test]
    fn test_zero_labels_are_capitalised_with_spaces() {
        let mut f = healthy();
        f.atmospheric_pressure = n(0.0);
        f.solar_radiation = Some(RawValue::Text("0".into()));
        let triggers = check_zero_readings(&aws(f));
        assert_eq!(labels(&triggers), vec!["Atmospheric pressure is 0", "Solar radiation is 0"]);
    }

    #[test]
    fn test_either_rain_column_fires_shared_category_once() {
        let mut f = healthy();
        f.hourly_rain = n(101.0);
        f.daily_rain = n(180.0);
        let triggers = evaluate_aws(&aws(f), &AlertConfig::default());
        assert_eq!(triggers.len(), 1);
        let t = &triggers[0];
        assert_eq!(t.category, AlertCategory::HeavyRainfall);
        assert_eq!(t.label, "Rainfall > 100mm");
        assert_eq!(
            t.context,
            Some(TriggerContext::Columns(vec!["hourly_rain".into(), "daily_rain".into()]))
        );
    }

    #[test]
    fn test_rain_exactly_at_threshold_does_not_fire() {
        let mut f = healthy();
        f.daily_rain = n(100.0);
        assert!(evaluate_aws(&aws(f), &AlertConfig::default()).is_empty());
    }

    #[test]
    fn test_legacy_rainfall_and_temperature() {
        let mut f = healthy();
        f.rainfall = n(55.0);
        f.temperature = n(41.5);
        let triggers = evaluate_aws(&aws(f), &AlertConfig::default());
        assert_eq!(labels(&triggers), vec!["High Rainfall (>50mm)", "High Temperature (>40)"]);
    }

    #[test]
    fn test_non_numeric_channel_skips_only_its_check() {
        let mut f = healthy();
        f.wind_speed = Some(RawValue::Text("calm".into()));
        f.temperature = n(45.0);
        let triggers = evaluate_aws(&aws(f), &AlertConfig::default());
        assert_eq!(labels(&triggers), vec!["High Temperature (>40)"]);
    }

    #[test]
    fn test_ars_heavy_rain() {
        let reading = Reading {
            measurements: Measurements::Ars(RainFields {
                hourly_rain: n(5.0),
                daily_rain: n(120.0),
            }),
            ..aws(healthy())
        };
        let t = check_ars_heavy_rain(&reading, &ArsConfig::default()).expect("daily rain >100");
        assert_eq!(t.category, AlertCategory::HeavyRain);
        assert_eq!(t.field, "daily_rain");
        assert_eq!(t.value, 120.0);
    }
}
