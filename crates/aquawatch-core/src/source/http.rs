use crate::error::{AquaError, FetchError};
use crate::model::{DeviceInfo, Reading, SampleValue};
use crate::source::DataSource;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::StatusCode;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

/// Row fields that describe the reading rather than a sensor value.
const NON_METRIC_FIELDS: &[&str] = &[
    "id",
    "device_id",
    "device_name",
    "recorded_at",
    "created_at",
    "updated_at",
];

/// Naive timestamp layouts the API has been seen to emit (interpreted as UTC).
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// [`DataSource`] backed by the dashboard REST API.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, AquaError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AquaError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            timeout,
        })
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url).query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| self.map_transport(e))?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::AuthExpired {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Failed(format!("HTTP {} from {}", status.as_u16(), url)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))
    }

    fn map_transport(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else {
            FetchError::Failed(e.to_string())
        }
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn list_devices(&self) -> Result<Vec<DeviceInfo>, FetchError> {
        let body = self.get_json("/member/devices", &[]).await?;
        parse_device_list(&body)
    }

    async fn fetch_latest_readings(&self, device_id: &str) -> Result<Vec<Reading>, FetchError> {
        let body = self
            .get_json("/member/water-quality", &[("deviceId", device_id)])
            .await?;
        parse_reading_rows(&body, device_id)
    }

    fn source_name(&self) -> &str {
        "http"
    }
}

/// Parse the `/member/devices` response body.
pub fn parse_device_list(body: &Value) -> Result<Vec<DeviceInfo>, FetchError> {
    let rows = body
        .as_array()
        .ok_or_else(|| FetchError::InvalidResponse("device list is not an array".into()))?;

    let mut devices = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(obj) = row.as_object() else {
            continue;
        };
        let Some(device_id) = obj.get("device_id").and_then(scalar_to_string) else {
            tracing::warn!(row = %row, "skipping device without device_id");
            continue;
        };
        let display_name = ["device_name", "name"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(scalar_to_string))
            .unwrap_or_else(|| device_id.clone());
        devices.push(DeviceInfo {
            device_id,
            display_name,
        });
    }
    Ok(devices)
}

/// Parse the `/member/water-quality` response body into readings.
///
/// Rows keep the API order (most recent first). Rows without a parseable
/// `recorded_at` are skipped.
pub fn parse_reading_rows(body: &Value, device_id: &str) -> Result<Vec<Reading>, FetchError> {
    let rows = body
        .as_array()
        .ok_or_else(|| FetchError::InvalidResponse("reading list is not an array".into()))?;

    let mut readings = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(obj) = row.as_object() else {
            continue;
        };
        match parse_row(obj, device_id) {
            Some(reading) => readings.push(reading),
            None => tracing::warn!(device_id, "skipping reading without a valid recorded_at"),
        }
    }
    Ok(readings)
}

fn parse_row(obj: &Map<String, Value>, fallback_device: &str) -> Option<Reading> {
    let recorded_at = obj
        .get("recorded_at")
        .and_then(Value::as_str)
        .and_then(parse_timestamp)?;
    let device_id = obj
        .get("device_id")
        .and_then(scalar_to_string)
        .unwrap_or_else(|| fallback_device.to_string());

    let mut values = BTreeMap::new();
    for (key, value) in obj {
        if NON_METRIC_FIELDS.contains(&key.as_str()) {
            continue;
        }
        let sample = match value {
            Value::Null => None,
            Value::Number(n) => n.as_f64().map(SampleValue::Number),
            Value::String(s) => Some(SampleValue::Text(s.clone())),
            _ => continue,
        };
        values.insert(key.clone(), sample);
    }

    Some(Reading {
        device_id,
        recorded_at,
        values,
    })
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
