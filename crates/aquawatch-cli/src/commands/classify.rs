use aquawatch_core::config::SessionConfig;
use aquawatch_core::error::AquaError;
use std::path::Path;

use crate::output;
use crate::RuleArgs;

pub fn run(
    input_file: &Path,
    rule_args: &RuleArgs,
    metrics: Vec<String>,
    output_format: &str,
    show_all: bool,
) -> Result<(), AquaError> {
    let table = super::resolve_rules(rule_args)?;

    let metrics = if metrics.is_empty() {
        SessionConfig::default().tracked_metrics
    } else {
        metrics
    };

    let json = std::fs::read_to_string(input_file)?;
    let readings = aquawatch_core::parse_readings_json(&json)?;
    tracing::debug!(
        file = %input_file.display(),
        readings = readings.len(),
        table = table.name(),
        "classifying readings"
    );

    let statuses = aquawatch_core::assess_readings(&readings, &metrics, &table);

    match output_format {
        "json" => output::json::print(&statuses)?,
        _ => output::table::print_statuses(&statuses, &table, show_all),
    }

    Ok(())
}
