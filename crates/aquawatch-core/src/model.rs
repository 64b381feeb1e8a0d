use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::rules::alias::canonical_metric;

/// A raw sensor value as delivered by the upstream API.
///
/// The dashboard API is loose about types: the same field can arrive as a
/// JSON number or as a string. Parsing happens at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleValue {
    Number(f64),
    Text(String),
}

impl SampleValue {
    /// Returns the numeric view of the value, or `None` if it is not numeric.
    ///
    /// Strings must be a complete number ("7.9", " 8 ", "1e2", "Infinity");
    /// partial numbers such as "7.9abc", empty strings and NaN are rejected.
    pub fn numeric(&self) -> Option<Numeric> {
        match self {
            SampleValue::Number(v) if v.is_nan() => None,
            SampleValue::Number(v) if v.is_finite() => Some(
                Decimal::from_str(&v.to_string())
                    .map(Numeric::Exact)
                    .unwrap_or(Numeric::Wide(*v)),
            ),
            SampleValue::Number(v) => Some(Numeric::Wide(*v)),
            SampleValue::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return None;
                }
                Decimal::from_str(s)
                    .or_else(|_| Decimal::from_scientific(s))
                    .map(Numeric::Exact)
                    .ok()
                    .or_else(|| {
                        s.parse::<f64>()
                            .ok()
                            .filter(|v| !v.is_nan())
                            .map(Numeric::Wide)
                    })
            }
        }
    }
}

/// A sample value ready for comparison against rule bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    /// Fits a `Decimal`; compared exactly.
    Exact(Decimal),
    /// Outside the `Decimal` range (sensor sentinels, infinities); compared as `f64`.
    Wide(f64),
}

impl Numeric {
    /// Orders the value against a rule bound.
    pub fn cmp_bound(&self, bound: Decimal) -> Option<Ordering> {
        match self {
            Numeric::Exact(d) => Some(d.cmp(&bound)),
            Numeric::Wide(v) => v.partial_cmp(&bound.to_f64()?),
        }
    }
}

impl fmt::Display for SampleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleValue::Number(v) => write!(f, "{v}"),
            SampleValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for SampleValue {
    fn from(v: f64) -> Self {
        SampleValue::Number(v)
    }
}

impl From<&str> for SampleValue {
    fn from(s: &str) -> Self {
        SampleValue::Text(s.to_string())
    }
}

/// One timestamped batch of sensor values from a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub device_id: String,
    pub recorded_at: DateTime<Utc>,
    /// Metric name as reported upstream -> value (`None` for JSON null).
    #[serde(default)]
    pub values: BTreeMap<String, Option<SampleValue>>,
}

impl Reading {
    pub fn new(device_id: impl Into<String>, recorded_at: DateTime<Utc>) -> Self {
        Self {
            device_id: device_id.into(),
            recorded_at,
            values: BTreeMap::new(),
        }
    }

    /// Builder-style helper, mostly for tests and fixtures.
    pub fn with_value(mut self, metric: &str, value: Option<SampleValue>) -> Self {
        self.values.insert(metric.to_string(), value);
        self
    }

    /// Look up the raw value for a metric, accepting any alias of it.
    ///
    /// An exact key match wins over an aliased one; a null value counts as
    /// missing, so a populated alias is used in its place.
    pub fn value(&self, metric: &str) -> Option<&SampleValue> {
        if let Some(Some(v)) = self.values.get(metric) {
            return Some(v);
        }
        let wanted = canonical_metric(metric);
        self.values
            .iter()
            .find(|(key, v)| v.is_some() && canonical_metric(key) == wanted)
            .and_then(|(_, v)| v.as_ref())
    }
}

/// Readings of one device, ordered by `recorded_at` ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingHistory {
    readings: Vec<Reading>,
}

impl ReadingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fetched batch (any order) and return how many readings were new.
    ///
    /// Only readings strictly newer than the current latest are kept, so the
    /// overlapping windows returned by consecutive polls are not duplicated.
    pub fn append(&mut self, mut batch: Vec<Reading>) -> usize {
        let cutoff = self.latest().map(|r| r.recorded_at);
        batch.retain(|r| cutoff.map_or(true, |c| r.recorded_at > c));
        batch.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at));
        let added = batch.len();
        self.readings.extend(batch);
        added
    }

    pub fn latest(&self) -> Option<&Reading> {
        self.readings.last()
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// A device as listed by the data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_id: String,
    pub display_name: String,
}
