pub mod http;

use crate::error::FetchError;
use crate::model::{DeviceInfo, Reading};
use async_trait::async_trait;

/// Data-access collaborator the polling session reads from.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Devices the current user can see.
    async fn list_devices(&self) -> Result<Vec<DeviceInfo>, FetchError>;

    /// Latest readings for a device, most recent first.
    async fn fetch_latest_readings(&self, device_id: &str) -> Result<Vec<Reading>, FetchError>;

    /// Name of this backend (for diagnostics).
    fn source_name(&self) -> &str;
}
