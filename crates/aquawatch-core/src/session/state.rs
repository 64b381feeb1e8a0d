use crate::classify::DeviceStatus;
use crate::error::FetchError;
use serde::Serialize;
use std::fmt;

/// Lifecycle of the selected device within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// No device selected.
    Idle,
    /// Device selected, no reading received yet.
    Loading,
    /// Last poll succeeded and at least one reading is available.
    Ready,
    /// Last poll failed; earlier readings are still served.
    Error,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "idle"),
            SessionPhase::Loading => write!(f, "loading"),
            SessionPhase::Ready => write!(f, "ready"),
            SessionPhase::Error => write!(f, "error"),
        }
    }
}

/// Published after every poll of the selected device, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusEvent {
    pub device_id: String,
    pub phase: SessionPhase,
    /// Status of the latest known reading; stale when `error` is set.
    pub status: DeviceStatus,
    /// Readings added to the history by this poll.
    pub new_readings: usize,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<FetchError>,
}

impl StatusEvent {
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

fn serialize_error<S: serde::Serializer>(
    error: &Option<FetchError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}
