//! Daily gate activity.

use crate::model::{numeric, Measurements, Reading};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Gate openings for one location on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateDay {
    pub location_id: String,
    pub location_name: String,
    pub date: NaiveDate,
    /// Largest usable opening per gate channel that day, by channel number.
    pub max_openings: BTreeMap<u32, f64>,
    /// Channels whose daily maximum is above zero, ascending.
    pub active_gates: Vec<String>,
}

impl GateDay {
    pub fn open_count(&self) -> usize {
        self.active_gates.len()
    }
}

/// Per (location, date) maximum opening of every gate channel. Only days
/// with at least one open gate are returned, sorted by location and date.
/// Non-gate readings and unusable values are ignored.
pub fn daily_gate_activity(readings: &[Reading]) -> Vec<GateDay> {
    let mut days: BTreeMap<(&str, NaiveDate), (&str, BTreeMap<u32, f64>)> = BTreeMap::new();

    for reading in readings {
        let gates = match &reading.measurements {
            Measurements::Gate(fields) => &fields.gates,
            _ => continue,
        };
        let (_, max_openings) = days
            .entry((reading.location_id.as_str(), reading.date()))
            .or_insert_with(|| (reading.location_name.as_str(), BTreeMap::new()));
        for gate in gates {
            if let Some(value) = numeric(&gate.value) {
                let slot = max_openings.entry(gate.number).or_insert(value);
                if value > *slot {
                    *slot = value;
                }
            }
        }
    }

    days.into_iter()
        .filter_map(|((location_id, date), (location_name, max_openings))| {
            let active_gates: Vec<String> = max_openings
                .iter()
                .filter(|(_, max)| **max > 0.0)
                .map(|(number, _)| format!("g{}", number))
                .collect();
            if active_gates.is_empty() {
                return None;
            }
            Some(GateDay {
                location_id: location_id.to_string(),
                location_name: location_name.to_string(),
                date,
                max_openings,
                active_gates,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GateChannel, GateFields, RawValue};

    fn gate_reading(id: &str, d: u32, hour: u32, values: &[f64]) -> Reading {
        Reading {
            location_id: id.into(),
            location_name: format!("Barrage {}", id),
            project_name: "Krishna".into(),
            timestamp: NaiveDate::from_ymd_opt(2024, 9, d).unwrap().and_hms_opt(hour, 0, 0).unwrap(),
            batt_volt: None,
            measurements: Measurements::Gate(GateFields {
                gates: values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| GateChannel {
                        name: format!("g{}", i + 1),
                        number: i as u32 + 1,
                        value: Some(RawValue::Number(*v)),
                    })
                    .collect(),
            }),
        }
    }

    #[test]
    fn test_daily_maximum_per_gate() {
        let readings = vec![
            gate_reading("B1", 1, 6, &[0.0, 0.5, 0.0]),
            gate_reading("B1", 1, 18, &[0.0, 1.2, 0.0]),
            gate_reading("B1", 2, 6, &[0.0, 0.0, 0.0]),
        ];
        let days = daily_gate_activity(&readings);
        assert_eq!(days.len(), 1, "closed days are not reported");
        assert_eq!(days[0].max_openings.get(&2), Some(&1.2));
        assert_eq!(days[0].active_gates, vec!["g2".to_string()]);
        assert_eq!(days[0].open_count(), 1);
    }

    #[test]
    fn test_sorted_by_location_then_date() {
        let readings = vec![
            gate_reading("B2", 3, 6, &[1.0]),
            gate_reading("B1", 4, 6, &[1.0, 2.0]),
            gate_reading("B1", 3, 6, &[1.0]),
        ];
        let days = daily_gate_activity(&readings);
        let keys: Vec<(&str, u32)> = days
            .iter()
            .map(|d| (d.location_id.as_str(), chrono::Datelike::day(&d.date)))
            .collect();
        assert_eq!(keys, vec![("B1", 3), ("B1", 4), ("B2", 3)]);
        assert_eq!(days[1].open_count(), 2);
    }
}
