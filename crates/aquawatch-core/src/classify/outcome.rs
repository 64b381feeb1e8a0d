use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Message shown for a metric or device within range.
pub const NORMAL_MESSAGE: &str = "OK";

/// Message shown when there is no data to judge.
pub const NO_DATA_MESSAGE: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Normal,
    Warning,
    Unknown,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Normal => write!(f, "normal"),
            Status::Warning => write!(f, "warning"),
            Status::Unknown => write!(f, "unknown"),
        }
    }
}

/// Display colour a presenter should use for a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorHint {
    Neutral,
    Normal,
    Danger,
}

impl ColorHint {
    /// CSS colour for dashboards and terminal presenters.
    pub fn hex(&self) -> &'static str {
        match self {
            ColorHint::Neutral => "#6c757d",
            ColorHint::Normal => "#28a745",
            ColorHint::Danger => "#dc3545",
        }
    }
}

/// Verdict for one metric value (or for a whole device).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub status: Status,
    /// Human-readable reason, e.g. "DO low".
    pub message: String,
    pub color_hint: ColorHint,
}

impl Classification {
    pub fn normal() -> Self {
        Self {
            status: Status::Normal,
            message: NORMAL_MESSAGE.to_string(),
            color_hint: ColorHint::Normal,
        }
    }

    pub fn warning(message: String) -> Self {
        Self {
            status: Status::Warning,
            message,
            color_hint: ColorHint::Danger,
        }
    }

    pub fn unknown() -> Self {
        Self {
            status: Status::Unknown,
            message: NO_DATA_MESSAGE.to_string(),
            color_hint: ColorHint::Neutral,
        }
    }

    pub fn is_warning(&self) -> bool {
        self.status == Status::Warning
    }
}

/// Aggregated verdict for a device, derived from its latest reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub device_id: String,
    /// Timestamp of the reading this status was computed from.
    pub recorded_at: Option<DateTime<Utc>>,
    pub overall: Classification,
    /// Canonical metric key -> classification.
    pub per_metric: BTreeMap<String, Classification>,
    /// Metrics that classified as Warning, in the order they were checked.
    pub triggered_by: Vec<String>,
}

impl DeviceStatus {
    /// Status for a device that has no reading yet.
    pub fn unknown<S: AsRef<str>>(device_id: &str, metrics: &[S]) -> Self {
        Self {
            device_id: device_id.to_string(),
            recorded_at: None,
            overall: Classification::unknown(),
            per_metric: metrics
                .iter()
                .map(|m| {
                    (
                        crate::rules::alias::canonical_metric(m.as_ref()).to_string(),
                        Classification::unknown(),
                    )
                })
                .collect(),
            triggered_by: Vec::new(),
        }
    }
}
