/// End-to-end tests: raw JSON rows → readings → alerts and reception.
///
/// These run entirely in memory and need no database.

use hydromon_service::alert::engine::AlertEngine;
use hydromon_service::alert::AlertCategory;
use hydromon_service::config::{parse_config, AlertConfig};
use hydromon_service::ingest::rows::{readings_from_rows, status_rows_from_json};
use hydromon_service::model::StationType;
use hydromon_service::reception::{self, DateWindow, ReceptionBand};
use hydromon_service::runner;
use hydromon_service::store::MemoryStore;

use chrono::NaiveDate;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn epan_row(id: &str, ts: &str, depth: Value, batt: Value) -> Value {
    json!({
        "location_id": id,
        "location_name": format!("Pan {}", id),
        "project_name": "Godavari",
        "last_updated": ts,
        "batt_volt": batt,
        "epan_water_depth": depth
    })
}

fn status_row(sr_no: i64, ts: &str, id: &str, count: Value) -> Value {
    json!({
        "sr_no": sr_no,
        "last_updated": ts,
        "project_name": "Godavari",
        "location_name": format!("Site {}", id),
        "location_id": id,
        "location_type": "EPAN",
        "problem_statement": null,
        "data_count": count
    })
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[test]
fn test_epan_rows_to_single_category_alerts() {
    let rows = vec![
        epan_row("P1", "09/01/2024 08:00", json!(80.0), json!(12.1)),
        epan_row("P1", "10/01/2024 08:00", json!("45"), json!("10.2")),
        epan_row("P1", "garbage", json!(1.0), json!(1.0)),
    ];
    let readings = readings_from_rows(StationType::Epan, &rows);
    assert_eq!(readings.len(), 2, "row with a bad timestamp is dropped");

    let alerts = AlertEngine::default().evaluate_batch(&readings);
    assert_eq!(alerts.len(), 1, "day 9 has no prior data and a healthy battery");
    let alert = &alerts[0];
    assert_eq!(alert.categories(), vec![AlertCategory::DepthChange]);
    let prior = alert.triggers[0].prior().expect("depth change carries its comparison");
    assert_eq!(prior.previous_value, 80.0);
    assert_eq!(prior.difference, 35.0);
    assert_eq!(prior.comparison_date, date(9));
}

#[test]
fn test_constant_depth_over_four_days() {
    let rows: Vec<Value> = (7..=10)
        .map(|d| epan_row("P2", &format!("{:02}/01/2024 06:30", d), json!(120.0), json!(12.5)))
        .collect();
    let readings = readings_from_rows(StationType::Epan, &rows);
    let alerts = AlertEngine::default().evaluate_batch(&readings);
    let last = alerts.last().expect("day 10 completes the run");
    assert_eq!(last.timestamp.date(), date(10));
    assert_eq!(last.alert_type(), "Constant Water Depth (4 days)");
}

#[test]
fn test_mixed_station_batches_through_runner() {
    let mut store = MemoryStore::new();
    store.insert_readings(readings_from_rows(
        StationType::Aws,
        &[json!({
            "location_id": "W1",
            "location_name": "Weather 1",
            "project_name": "Godavari",
            "last_updated": "10/01/2024 14:00",
            "batt_volt": 12.6,
            "atmospheric_pressure": 1004.0,
            "temperature": 0,
            "humidity": 40,
            "solar_radiation": 210,
            "wind_speed": 31.5,
            "hourly_rain": 0.0,
            "daily_rain": 18.5
        })],
    ));
    store.insert_readings(readings_from_rows(
        StationType::Epan,
        &[
            epan_row("P1", "09/01/2024 08:00", json!(80.0), json!(12.1)),
            epan_row("P1", "10/01/2024 08:00", json!(45.0), json!(12.1)),
        ],
    ));
    store.insert_readings(readings_from_rows(
        StationType::Gate,
        &[json!({
            "location_id": "B1",
            "location_name": "Barrage 1",
            "project_name": "Godavari",
            "last_updated": "10/01/2024 06:00",
            "batt_volt": 12.0,
            "g1": 0.0,
            "g2": "1.50",
            "g3": 2.0
        })],
    ));
    store.insert_status_rows(status_rows_from_json(&[
        status_row(1, "10/01/2024 08:00", "P1", json!(12.0)),
        status_row(2, "10/01/2024 08:00", "W1", json!(24.0)),
    ]));

    let report = runner::run(&mut store, &AlertConfig::default(), DateWindow::single_day(date(10)));

    let types: Vec<StationType> = report.alerts.iter().map(|a| a.station_type).collect();
    assert_eq!(types, vec![StationType::Epan, StationType::Aws, StationType::Gate]);

    let aws = &report.alerts[1];
    assert_eq!(aws.alert_type(), "Temperature is 0, High Wind Speed (>30)");

    let gate = &report.alerts[2];
    assert_eq!(gate.alert_type(), "Gate Opening Detected (g2)");
    assert_eq!(report.gate_activity.len(), 1);
    assert_eq!(report.gate_activity[0].active_gates, vec!["g2", "g3"]);

    assert_eq!(report.epan_rain.len(), 1);
    assert_eq!(report.epan_rain[0].daily_rain, 18.5);

    let low = report.reception.alerts();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].location_id, "P1");
    assert_eq!(low[0].percentage, 50.0);
}

#[test]
fn test_config_selects_level_variants() {
    let config = parse_config(
        r#"
        [level]
        lookback_diff = false
        absolute_bound = true
        "#,
    )
    .expect("valid config");
    let rows = vec![
        json!({"location_id": "D1", "last_updated": "09/01/2024 08:00", "level_mtr": 50.0, "batt_volt": 12.0}),
        json!({"location_id": "D1", "last_updated": "10/01/2024 08:00", "level_mtr": 101.0, "batt_volt": 12.0}),
    ];
    let readings = readings_from_rows(StationType::Dam, &rows);
    let alerts = AlertEngine::new(config).evaluate_batch(&readings);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].categories(), vec![AlertCategory::ExtremeLevel]);
    assert_eq!(alerts[0].alert_type(), "Level ≥100m");
}

// ---------------------------------------------------------------------------
// Reception
// ---------------------------------------------------------------------------

#[test]
fn test_reception_over_two_report_sections() {
    let rows = status_rows_from_json(&[
        // Section dated 01/01: one row straddles midnight.
        status_row(1, "01/01/2024 23:00", "A", json!(20.0)),
        status_row(2, "01/01/2024 23:00", "B", json!(24.0)),
        status_row(3, "02/01/2024 00:05", "A", json!(22.0)),
        // Section dated 02/01.
        status_row(1, "02/01/2024 23:00", "A", json!(24.0)),
        status_row(2, "02/01/2024 23:00", "B", json!(6.0)),
    ]);
    let report = reception::evaluate(&rows, DateWindow::new(date(1), date(2)), &Default::default());
    assert_eq!(report.summaries.len(), 2);

    let a = &report.summaries[0];
    assert_eq!(a.location_id, "A");
    assert_eq!(a.data_count, 46.0, "daily maxima 22 + 24");
    assert_eq!(a.percentage, 95.83);
    assert!(!a.alert);

    let b = &report.summaries[1];
    assert_eq!(b.percentage, 62.5);
    assert!(b.alert);
    assert_eq!(b.band(), Some(ReceptionBand::From60To69));
}

#[test]
fn test_null_data_counts_from_the_feed_lower_reception() {
    let rows = status_rows_from_json(&[
        status_row(1, "01/01/2024 08:00", "A", json!(24)),
        status_row(2, "01/01/2024 08:00", "B", json!(null)),
        status_row(1, "02/01/2024 08:00", "A", json!(null)),
        status_row(2, "garbled", "B", json!(null)),
        status_row(3, "02/01/2024 08:05", "B", json!(null)),
    ]);
    assert_eq!(rows.len(), 5, "null counts and bad timestamps keep their rows");

    let report = reception::evaluate(&rows, DateWindow::new(date(1), date(2)), &Default::default());
    assert_eq!(report.summaries.len(), 2, "B never sent a count but is still reported");

    let a = &report.summaries[0];
    assert_eq!(a.days_with_data, 2);
    assert_eq!(a.percentage, 50.0);
    assert!(a.alert);

    let b = &report.summaries[1];
    assert_eq!(b.location_id, "B");
    assert_eq!(b.days_with_data, 2);
    assert_eq!(b.data_count, 0.0);
    assert_eq!(b.percentage, 0.0);
    assert!(b.alert);
    assert_eq!(report.alerts().len(), 2);
}
