//! Integration tests for the evaluation pipeline: rule tables, per-metric
//! classification and device aggregation over realistic API rows.

use aquawatch_core::classify::{aggregate_device, classify, Status};
use aquawatch_core::model::{Reading, SampleValue};
use aquawatch_core::rules::builtin::{self, load_preset};
use aquawatch_core::rules::parse_rule_table_str;
use aquawatch_core::{assess_readings, parse_readings_json};
use chrono::{TimeZone, Utc};

fn reading(values: &[(&str, Option<SampleValue>)]) -> Reading {
    values.iter().fold(
        Reading::new("WQ-001", Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()),
        |r, (k, v)| r.with_value(k, v.clone()),
    )
}

// ---------------------------------------------------------------------------
// Test 1: DO rule {4, 99} boundary behaviour
// ---------------------------------------------------------------------------
#[test]
fn dissolved_oxygen_boundaries() {
    let pond = load_preset("pond").unwrap();

    let low = classify("do", Some(&SampleValue::Number(3.5)), &pond);
    assert_eq!(low.status, Status::Warning);
    assert_eq!(low.message, "DO low");

    let edge = classify("do", Some(&SampleValue::Number(4.0)), &pond);
    assert_eq!(edge.status, Status::Normal);

    let missing = classify("do", None, &pond);
    assert_eq!(missing.status, Status::Unknown);
}

// ---------------------------------------------------------------------------
// Test 2: mixed reading against the standard table
// ---------------------------------------------------------------------------
#[test]
fn mixed_reading_is_warning() {
    let r = reading(&[
        ("ph", Some(SampleValue::Number(8.0))),
        ("do", Some(SampleValue::Number(2.0))),
        ("temp", None),
    ]);
    let status = aggregate_device(&r, &["ph", "do", "temp"], builtin::standard());

    assert_eq!(status.overall.status, Status::Warning);
    assert_eq!(status.per_metric["ph"].status, Status::Normal);
    assert_eq!(status.per_metric["do"].status, Status::Warning);
    assert_eq!(status.per_metric["temp"].status, Status::Unknown);
    assert_eq!(status.triggered_by, vec!["do"]);
}

// ---------------------------------------------------------------------------
// Test 3: a device with every sensor silent is reported Normal
// ---------------------------------------------------------------------------
#[test]
fn all_sensors_silent_is_normal() {
    let r = reading(&[
        ("ph", None),
        ("dissolved_oxygen", None),
        ("temperature", Some(SampleValue::Text("offline".into()))),
    ]);
    let status = aggregate_device(&r, &["ph", "do", "temp", "turbidity"], builtin::standard());
    assert_eq!(status.overall.status, Status::Normal);
    assert!(status.per_metric.values().all(|c| c.status == Status::Unknown));
}

// ---------------------------------------------------------------------------
// Test 4: raw API export classified row by row
// ---------------------------------------------------------------------------
#[test]
fn api_export_rows_classified_independently() {
    let json = r#"[
        { "device_id": "WQ-001", "recorded_at": "2025-03-01T08:10:00Z",
          "ph": 7.4, "dissolved_oxygen": 5.2, "temperature": 28.1, "salinity": 15 },
        { "device_id": "WQ-001", "recorded_at": "2025-03-01T08:00:00Z",
          "ph": "9.0", "dissolved_oxygen": 2.9, "temperature": 28.0, "salinity": null }
    ]"#;
    let readings = parse_readings_json(json).unwrap();
    assert_eq!(readings.len(), 2);

    let statuses = assess_readings(&readings, &["ph", "do", "temp"], builtin::standard());
    assert_eq!(statuses[0].overall.status, Status::Normal);
    assert_eq!(statuses[1].overall.status, Status::Warning);
    assert_eq!(statuses[1].overall.message, "pH high, DO low");
}

// ---------------------------------------------------------------------------
// Test 5: structured readings JSON
// ---------------------------------------------------------------------------
#[test]
fn structured_readings_json() {
    let json = r#"[
        { "device_id": "WQ-002", "recorded_at": "2025-03-01T08:00:00Z",
          "values": { "ph": 6.4, "turbidity": "250" } }
    ]"#;
    let readings = parse_readings_json(json).unwrap();
    assert_eq!(readings[0].device_id, "WQ-002");

    let statuses = assess_readings(&readings, &["ph", "turbidity"], builtin::standard());
    assert_eq!(statuses[0].overall.message, "pH low");
    assert_eq!(statuses[0].per_metric["turbidity"].status, Status::Normal);
}

// ---------------------------------------------------------------------------
// Test 6: custom rule table with a metric the built-ins do not know
// ---------------------------------------------------------------------------
#[test]
fn custom_table_adds_salinity() {
    let table = parse_rule_table_str(
        r#"{
            "name": "Brackish",
            "version": "2.0",
            "rules": [
                { "metric": "ph", "min": "7.0", "max": "8.5", "label": "pH" },
                { "metric": "salinity", "min": "10", "max": "25", "label": "Salinity", "unit": "ppt" }
            ]
        }"#,
    )
    .unwrap();

    let r = reading(&[
        ("ph", Some(SampleValue::Number(7.0))),
        ("salinity", Some(SampleValue::Number(30.0))),
        ("do", Some(SampleValue::Number(0.5))),
    ]);
    let status = aggregate_device(&r, &["ph", "salinity", "do"], &table);

    // DO has no rule in this table, so it cannot alarm
    assert_eq!(status.per_metric["do"].status, Status::Normal);
    assert_eq!(status.overall.message, "Salinity high");
}

// ---------------------------------------------------------------------------
// Test 7: repeated evaluation yields equal values
// ---------------------------------------------------------------------------
#[test]
fn evaluation_is_idempotent() {
    let r = reading(&[
        ("ph", Some(SampleValue::Number(6.0))),
        ("dissolved_oxygen", Some(SampleValue::Text("3.08".into()))),
    ]);
    let table = builtin::standard();
    let first = aggregate_device(&r, &["ph", "do"], table);
    let second = aggregate_device(&r, &["ph", "do"], table);
    assert_eq!(first, second);
    assert_eq!(second.per_metric["do"].status, Status::Normal);
}

// ---------------------------------------------------------------------------
// Test 8: a faulty sensor sending a huge sentinel still escalates the device
// ---------------------------------------------------------------------------
#[test]
fn sensor_sentinel_escalates_device() {
    let json = r#"[
        { "device_id": "WQ-003", "recorded_at": "2025-03-01T08:00:00Z",
          "ph": 7.2, "dissolved_oxygen": 9.9e37, "temperature": "1e30" }
    ]"#;
    let readings = parse_readings_json(json).unwrap();
    let statuses = assess_readings(&readings, &["ph", "do", "temp"], builtin::standard());

    assert_eq!(statuses[0].overall.status, Status::Warning);
    assert_eq!(statuses[0].overall.message, "DO high, Temp high");
    assert_eq!(statuses[0].triggered_by, vec!["do", "temp"]);
}
