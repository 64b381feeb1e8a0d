pub mod classify;
pub mod config;
pub mod error;
pub mod model;
pub mod rules;
pub mod session;
pub mod source;
pub mod store;

use classify::{aggregate_device, DeviceStatus};
use model::Reading;
use rules::RuleTable;

pub use config::SessionConfig;
pub use error::{AquaError, FetchError};
pub use session::state::{SessionPhase, StatusEvent};
pub use session::PollingSession;

/// Classify a batch of readings, e.g. an exported table of rows.
///
/// Each reading is evaluated independently over `metrics`; output order
/// follows input order.
pub fn assess_readings<S: AsRef<str>>(
    readings: &[Reading],
    metrics: &[S],
    table: &RuleTable,
) -> Vec<DeviceStatus> {
    readings
        .iter()
        .map(|reading| aggregate_device(reading, metrics, table))
        .collect()
}

/// Parse readings from JSON: either an array of [`Reading`] objects or the
/// flat rows returned by the dashboard API.
pub fn parse_readings_json(json: &str) -> Result<Vec<Reading>, AquaError> {
    let body: serde_json::Value = serde_json::from_str(json)?;
    let structured = body.as_array().is_some_and(|rows| {
        !rows.is_empty() && rows.iter().all(|row| row.get("values").is_some_and(|v| v.is_object()))
    });
    if structured {
        return Ok(serde_json::from_value(body)?);
    }
    Ok(source::http::parse_reading_rows(&body, "unknown")?)
}
