use aquawatch_core::classify::{summarize, ColorHint, DeviceStatus, Status};
use aquawatch_core::model::DeviceInfo;
use aquawatch_core::rules::RuleTable;
use aquawatch_core::StatusEvent;
use std::io::IsTerminal;

pub fn print_statuses(statuses: &[DeviceStatus], table: &RuleTable, show_all: bool) {
    println!("=== {} ===\n", table.name());

    if statuses.is_empty() {
        println!("  No readings.");
        return;
    }

    for (i, status) in statuses.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_status(status, table, show_all);
    }
}

pub fn print_event(event: &StatusEvent, table: &RuleTable, show_all: bool) {
    match &event.error {
        Some(e) => println!("[{}] {}  poll failed: {}", event.phase, event.device_id, e),
        None => println!(
            "[{}] {}  +{} reading(s)",
            event.phase, event.device_id, event.new_readings
        ),
    }
    print_status(&event.status, table, show_all);
    println!();
}

/// One line per reading, most recent first.
pub fn print_history(statuses: &[DeviceStatus], limit: usize) {
    if statuses.is_empty() {
        return;
    }
    println!("  History:");
    for status in statuses.iter().take(limit) {
        let recorded = status
            .recorded_at
            .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        println!(
            "    {}  {}",
            recorded,
            paint(&summarize(status), status.overall.color_hint)
        );
    }
    println!();
}

pub fn print_devices(devices: &[DeviceInfo]) {
    if devices.is_empty() {
        println!("No devices.");
        return;
    }

    let max_id = devices
        .iter()
        .map(|d| d.device_id.len())
        .max()
        .unwrap_or(10)
        .max("Device".len());

    println!("  {:<width$}  Name", "Device", width = max_id);
    println!("  {}", "-".repeat(max_id + 20));
    for device in devices {
        println!(
            "  {:<width$}  {}",
            device.device_id,
            device.display_name,
            width = max_id
        );
    }
}

fn print_status(status: &DeviceStatus, table: &RuleTable, show_all: bool) {
    let recorded = match status.recorded_at {
        Some(at) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "no reading".to_string(),
    };
    println!("  {}  ({})", status.device_id, recorded);
    println!("  Overall: {}", paint(&summarize(status), status.overall.color_hint));

    // Without --show-all only the metrics that raised the warning are listed
    let rows: Vec<_> = status
        .per_metric
        .iter()
        .filter(|(_, c)| show_all || c.status == Status::Warning)
        .collect();
    if rows.is_empty() {
        return;
    }

    let label = |metric: &str| {
        table
            .lookup(metric)
            .map(|r| r.label.clone())
            .unwrap_or_else(|| metric.to_string())
    };
    let max_name = rows.iter().map(|(m, _)| label(m).len()).max().unwrap_or(10);

    for (metric, c) in rows {
        println!(
            "    {:<width$}  {} {}",
            label(metric),
            paint(&format!("{:<8}", c.status.to_string()), c.color_hint),
            c.message,
            width = max_name
        );
    }
}

/// Colour `text` with the hint's hex colour when stdout is a terminal.
fn paint(text: &str, hint: ColorHint) -> String {
    if !std::io::stdout().is_terminal() {
        return text.to_string();
    }
    let hex = hint.hex().trim_start_matches('#');
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
    format!(
        "\x1b[38;2;{};{};{}m{}\x1b[0m",
        channel(0),
        channel(2),
        channel(4),
        text
    )
}
