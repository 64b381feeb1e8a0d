use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A rule table definition as stored in JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTableDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    pub rules: Vec<MetricRule>,
}

/// Acceptable range for a single metric.
///
/// Bounds are inclusive: values equal to `min` or `max` are normal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricRule {
    /// Canonical metric key (e.g., "ph", "do").
    pub metric: String,
    /// Lower bound (as string for exact decimal).
    pub min: Decimal,
    /// Upper bound (as string for exact decimal).
    pub max: Decimal,
    /// Short label used in messages (e.g., "DO").
    pub label: String,
    #[serde(default)]
    pub unit: String,
}

impl MetricRule {
    pub fn new(metric: &str, min: Decimal, max: Decimal, label: &str, unit: &str) -> Self {
        Self {
            metric: metric.to_string(),
            min,
            max,
            label: label.to_string(),
            unit: unit.to_string(),
        }
    }
}
