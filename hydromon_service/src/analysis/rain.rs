//! Project-level rain context for evaporation pan alerts.
//!
//! A pan reading that jumps is often explained by rain. The alert tables
//! show, next to every EPAN alert, the daily rain reported by the
//! project's weather station on the alert's own day.

use crate::alert::AlertRecord;
use crate::model::{Reading, StationType, FIELD_DAILY_RAIN};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

/// Daily rain per project from the most recent AWS reading on `date`.
/// A project whose latest reading has no usable `daily_rain` maps to 0.
pub fn project_daily_rain(aws_readings: &[Reading], date: NaiveDate) -> BTreeMap<String, f64> {
    let mut latest: BTreeMap<&str, (NaiveDateTime, &Reading)> = BTreeMap::new();
    for reading in aws_readings {
        if reading.station_type() != StationType::Aws || reading.date() != date {
            continue;
        }
        let newer = latest
            .get(reading.project_name.as_str())
            .map(|(seen, _)| reading.timestamp > *seen)
            .unwrap_or(true);
        if newer {
            latest.insert(reading.project_name.as_str(), (reading.timestamp, reading));
        }
    }
    latest
        .into_iter()
        .map(|(project, (_, reading))| {
            (project.to_string(), reading.value(FIELD_DAILY_RAIN).unwrap_or(0.0))
        })
        .collect()
}

/// An EPAN alert with its project's rain for the day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RainAnnotatedAlert {
    pub alert: AlertRecord,
    pub daily_rain: f64,
}

impl RainAnnotatedAlert {
    /// "-" when no rain was recorded.
    pub fn daily_rain_display(&self) -> String {
        if self.daily_rain == 0.0 {
            "-".to_string()
        } else {
            self.daily_rain.to_string()
        }
    }
}

/// Attaches project rain on the alert's own day to every EPAN alert.
/// Other station types are skipped; projects without AWS data that day
/// get 0.
pub fn annotate_epan_alerts(alerts: &[AlertRecord], aws_readings: &[Reading]) -> Vec<RainAnnotatedAlert> {
    let mut by_date: BTreeMap<NaiveDate, BTreeMap<String, f64>> = BTreeMap::new();
    alerts
        .iter()
        .filter(|a| a.station_type == StationType::Epan)
        .map(|a| {
            let date = a.timestamp.date();
            let project_rain = by_date
                .entry(date)
                .or_insert_with(|| project_daily_rain(aws_readings, date));
            RainAnnotatedAlert {
                alert: a.clone(),
                daily_rain: project_rain.get(&a.project_name).copied().unwrap_or(0.0),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{AlertCategory, Trigger};
    use crate::model::{AwsFields, Measurements, RawValue};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 12).unwrap()
    }

    fn aws(project: &str, hour: u32, daily_rain: Option<RawValue>) -> Reading {
        aws_on(date(), project, hour, daily_rain)
    }

    fn aws_on(day: NaiveDate, project: &str, hour: u32, daily_rain: Option<RawValue>) -> Reading {
        Reading {
            location_id: format!("{}-aws", project),
            location_name: "Weather".into(),
            project_name: project.into(),
            timestamp: day.and_hms_opt(hour, 0, 0).unwrap(),
            batt_volt: None,
            measurements: Measurements::Aws(AwsFields { daily_rain, ..Default::default() }),
        }
    }

    fn epan_alert(project: &str) -> AlertRecord {
        epan_alert_on(date(), project)
    }

    fn epan_alert_on(day: NaiveDate, project: &str) -> AlertRecord {
        AlertRecord {
            station_type: StationType::Epan,
            location_id: "P1".into(),
            location_name: "Pan".into(),
            project_name: project.into(),
            timestamp: day.and_hms_opt(8, 0, 0).unwrap(),
            triggers: vec![Trigger::new(
                AlertCategory::LowBattery,
                "batt_volt",
                10.0,
                10.5,
                "Low Battery (<10.5V)".into(),
            )],
        }
    }

    #[test]
    fn test_latest_reading_of_the_day_wins() {
        let readings = vec![
            aws("Tapi", 9, Some(RawValue::Number(12.0))),
            aws("Tapi", 17, Some(RawValue::Number(31.5))),
            aws("Tapi", 11, Some(RawValue::Number(20.0))),
        ];
        let rain = project_daily_rain(&readings, date());
        assert_eq!(rain.get("Tapi"), Some(&31.5));
    }

    #[test]
    fn test_unusable_rain_maps_to_zero() {
        let readings = vec![aws("Tapi", 9, Some(RawValue::Text("NA".into())))];
        assert_eq!(project_daily_rain(&readings, date()).get("Tapi"), Some(&0.0));
    }

    #[test]
    fn test_annotation_defaults_to_no_rain() {
        let readings = vec![aws("Tapi", 9, Some(RawValue::Number(42.0)))];
        let annotated = annotate_epan_alerts(&[epan_alert("Tapi"), epan_alert("Bhima")], &readings);
        assert_eq!(annotated[0].daily_rain, 42.0);
        assert_eq!(annotated[1].daily_rain, 0.0);
        assert_eq!(annotated[1].daily_rain_display(), "-");
    }

    #[test]
    fn test_each_alert_gets_rain_of_its_own_day() {
        let earlier = date().pred_opt().unwrap();
        let readings = vec![
            aws_on(earlier, "Tapi", 18, Some(RawValue::Number(80.0))),
            aws("Tapi", 18, Some(RawValue::Number(3.0))),
        ];
        let annotated = annotate_epan_alerts(
            &[epan_alert_on(earlier, "Tapi"), epan_alert("Tapi")],
            &readings,
        );
        assert_eq!(annotated[0].daily_rain, 80.0);
        assert_eq!(annotated[1].daily_rain, 3.0);
    }
}
