use aquawatch_core::error::AquaError;
use aquawatch_core::source::DataSource;

use crate::output;
use crate::ApiArgs;

pub async fn run(api: &ApiArgs, output_format: &str) -> Result<(), AquaError> {
    let source = super::http_source(api)?;
    let devices = source.list_devices().await?;
    tracing::debug!(count = devices.len(), "devices listed");

    match output_format {
        "json" => output::json::print(&devices)?,
        _ => output::table::print_devices(&devices),
    }
    Ok(())
}
