use crate::classify::outcome::{Classification, DeviceStatus, NORMAL_MESSAGE};
use crate::model::{Reading, SampleValue};
use crate::rules::alias::canonical_metric;
use crate::rules::RuleTable;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Classify a single metric value against a rule table.
///
/// Never fails: missing or non-numeric values are Unknown, metrics without a
/// rule are Normal, and bounds are inclusive.
pub fn classify(metric: &str, value: Option<&SampleValue>, table: &RuleTable) -> Classification {
    let Some(numeric) = value.and_then(SampleValue::numeric) else {
        return Classification::unknown();
    };

    let Some(rule) = table.lookup(metric) else {
        return Classification::normal();
    };

    if numeric.cmp_bound(rule.min) == Some(Ordering::Less) {
        Classification::warning(format!("{} low", rule.label))
    } else if numeric.cmp_bound(rule.max) == Some(Ordering::Greater) {
        Classification::warning(format!("{} high", rule.label))
    } else {
        Classification::normal()
    }
}

/// Classify every tracked metric of a reading and combine them.
///
/// Any Warning makes the device Warning; Normal and Unknown metrics never
/// escalate, so a reading with no usable values is overall Normal.
pub fn aggregate_device<S: AsRef<str>>(
    reading: &Reading,
    metrics: &[S],
    table: &RuleTable,
) -> DeviceStatus {
    let mut per_metric = BTreeMap::new();
    let mut triggered_by = Vec::new();
    let mut warnings = Vec::new();

    for metric in metrics {
        let key = canonical_metric(metric.as_ref());
        if per_metric.contains_key(key) {
            continue;
        }

        let result = classify(key, reading.value(key), table);
        if result.is_warning() {
            triggered_by.push(key.to_string());
            warnings.push(result.message.clone());
        }
        per_metric.insert(key.to_string(), result);
    }

    let overall = if warnings.is_empty() {
        Classification::normal()
    } else {
        Classification::warning(warnings.join(", "))
    };

    tracing::trace!(
        device_id = %reading.device_id,
        overall = %overall.status,
        checked = per_metric.len(),
        "aggregated device status"
    );

    DeviceStatus {
        device_id: reading.device_id.clone(),
        recorded_at: Some(reading.recorded_at),
        overall,
        per_metric,
        triggered_by,
    }
}

/// Short human summary of a status, e.g. "OK" or "Warning: DO low".
pub fn summarize(status: &DeviceStatus) -> String {
    if status.overall.is_warning() {
        format!("Warning: {}", status.overall.message)
    } else if status.recorded_at.is_none() {
        "No data".to_string()
    } else {
        NORMAL_MESSAGE.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::outcome::{ColorHint, Status};
    use crate::rules::builtin;
    use crate::rules::schema::{MetricRule, RuleTableDef};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn do_table() -> RuleTable {
        RuleTable::from_def(RuleTableDef {
            name: "DO only".into(),
            description: None,
            version: "1.0".into(),
            rules: vec![MetricRule::new("do", dec!(4), dec!(99), "DO", "mg/L")],
        })
        .unwrap()
    }

    fn num(v: f64) -> SampleValue {
        SampleValue::Number(v)
    }

    fn reading() -> Reading {
        Reading::new("pond-1", Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap())
    }

    #[test]
    fn test_below_min_is_warning_low() {
        let c = classify("do", Some(&num(3.5)), &do_table());
        assert_eq!(c.status, Status::Warning);
        assert_eq!(c.message, "DO low");
        assert_eq!(c.color_hint, ColorHint::Danger);
    }

    #[test]
    fn test_above_max_is_warning_high() {
        let c = classify("do", Some(&num(120.0)), &do_table());
        assert_eq!(c.status, Status::Warning);
        assert_eq!(c.message, "DO high");
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let table = do_table();
        assert_eq!(classify("do", Some(&num(4.0)), &table).status, Status::Normal);
        assert_eq!(classify("do", Some(&num(99.0)), &table).status, Status::Normal);
        assert_eq!(classify("do", Some(&"4".into()), &table).status, Status::Normal);
    }

    #[test]
    fn test_values_beyond_decimal_range_still_warn() {
        let table = builtin::standard();
        let high = classify("ph", Some(&num(1e30)), table);
        assert_eq!(high.status, Status::Warning);
        assert_eq!(high.message, "pH high");

        let low = classify("ph", Some(&num(-1e30)), table);
        assert_eq!(low.message, "pH low");

        for text in ["1e30", "9.9e37", "Infinity", "100000000000000000000000000000"] {
            let c = classify("ph", Some(&text.into()), table);
            assert_eq!(c.message, "pH high", "{text}");
        }
    }

    #[test]
    fn test_in_range_values_are_normal() {
        let table = builtin::standard();
        for v in [6.5, 7.0, 7.77, 8.5] {
            let c = classify("ph", Some(&num(v)), table);
            assert_eq!(c.status, Status::Normal, "pH {v}");
            assert_eq!(c.message, "OK");
        }
    }

    #[test]
    fn test_absent_value_is_unknown() {
        let c = classify("do", None, &do_table());
        assert_eq!(c, Classification::unknown());
        assert_eq!(c.message, "-");
        assert_eq!(c.color_hint, ColorHint::Neutral);
    }

    #[test]
    fn test_non_numeric_is_unknown_not_zero() {
        // Coercing "n/a" to 0 would read as "DO low"
        let table = do_table();
        assert_eq!(classify("do", Some(&"n/a".into()), &table).status, Status::Unknown);
        assert_eq!(classify("do", Some(&"".into()), &table).status, Status::Unknown);
        assert_eq!(
            classify("salinity", Some(&"abc".into()), &table).status,
            Status::Unknown
        );
    }

    #[test]
    fn test_metric_without_rule_is_normal() {
        let c = classify("salinity", Some(&num(35.0)), builtin::standard());
        assert_eq!(c, Classification::normal());
    }

    #[test]
    fn test_alias_resolves_to_rule() {
        let table = do_table();
        assert!(classify("dissolved_oxygen", Some(&num(2.0)), &table).is_warning());
        assert!(classify("oxygen", Some(&num(2.0)), &table).is_warning());
    }

    #[test]
    fn test_aggregate_mixed_reading() {
        let r = reading()
            .with_value("ph", Some(num(8.0)))
            .with_value("dissolved_oxygen", Some(num(2.0)))
            .with_value("temperature", None);
        let status = aggregate_device(&r, &["ph", "do", "temp"], builtin::standard());

        assert_eq!(status.overall.status, Status::Warning);
        assert_eq!(status.overall.message, "DO low");
        assert_eq!(status.triggered_by, vec!["do"]);
        assert_eq!(status.per_metric["ph"].status, Status::Normal);
        assert_eq!(status.per_metric["do"].status, Status::Warning);
        assert_eq!(status.per_metric["temp"].status, Status::Unknown);
    }

    #[test]
    fn test_aggregate_all_unknown_is_normal() {
        let metrics = ["ph", "do", "temp", "turbidity"];
        let status = aggregate_device(&reading(), &metrics, builtin::standard());
        assert_eq!(status.overall.status, Status::Normal);
        assert!(status.triggered_by.is_empty());
        assert!(status
            .per_metric
            .values()
            .all(|c| c.status == Status::Unknown));
    }

    #[test]
    fn test_aggregate_joins_multiple_warnings() {
        let r = reading()
            .with_value("ph", Some(num(9.1)))
            .with_value("temp", Some(num(24.0)));
        let status = aggregate_device(&r, &["ph", "do", "temp"], builtin::standard());
        assert_eq!(status.overall.message, "pH high, Temp low");
        assert_eq!(status.triggered_by, vec!["ph", "temp"]);
        assert_eq!(summarize(&status), "Warning: pH high, Temp low");
    }

    #[test]
    fn test_aggregate_dedupes_aliased_metrics() {
        let r = reading().with_value("do", Some(num(5.0)));
        let metrics = ["do", "oxygen", "dissolved_oxygen"];
        let status = aggregate_device(&r, &metrics, builtin::standard());
        assert_eq!(status.per_metric.len(), 1);
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let r = reading()
            .with_value("ph", Some(num(5.0)))
            .with_value("do", Some("7.2".into()));
        let table = builtin::standard();
        let metrics = ["ph", "do", "temp"];
        assert_eq!(
            aggregate_device(&r, &metrics, table),
            aggregate_device(&r, &metrics, table)
        );
        assert_eq!(
            classify("ph", r.value("ph"), table),
            classify("ph", r.value("ph"), table)
        );
    }

    #[test]
    fn test_unknown_status_has_no_reading() {
        let status = DeviceStatus::unknown("pond-9", &["ph", "oxygen"]);
        assert_eq!(status.overall.status, Status::Unknown);
        assert!(status.per_metric.contains_key("do"));
        assert_eq!(summarize(&status), "No data");
    }
}
