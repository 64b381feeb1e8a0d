use aquawatch_core::error::AquaError;
use aquawatch_core::rules::{builtin, load_rule_table, RuleTable};
use std::path::Path;

pub fn list() -> Result<(), AquaError> {
    println!("Available predefined rule tables:\n");
    for name in builtin::PRESETS {
        let table = builtin::load_preset(name)?;
        let default_marker = if *name == builtin::DEFAULT_PRESET {
            " [default]"
        } else {
            ""
        };
        println!(
            "  {:<10} {} (v{}){}",
            name,
            table.name(),
            table.version(),
            default_marker
        );
        if let Some(desc) = table.description() {
            println!("             {}", desc);
        }
        println!();
    }
    Ok(())
}

pub fn explain(preset: &str) -> Result<(), AquaError> {
    let table = builtin::load_preset(preset)?;

    println!("{} (version {})\n", table.name(), table.version());
    if let Some(desc) = table.description() {
        println!("{}\n", desc);
    }

    println!("A metric is Normal inside its range (bounds included) and a Warning");
    println!("below the minimum or above the maximum. Missing or non-numeric values");
    println!("are Unknown. A device is a Warning when any tracked metric is.\n");

    print_ranges(&table);
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), AquaError> {
    let table = load_rule_table(file)?;

    println!("Rule table '{}' (v{}) is valid.", table.name(), table.version());
    println!("  Metrics: {}", table.metrics().join(", "));

    let mut warnings = Vec::new();
    for rule in table.rules() {
        if rule.min == rule.max {
            warnings.push(format!(
                "metric '{}' accepts a single value ({})",
                rule.metric, rule.min
            ));
        }
        if rule.unit.is_empty() && rule.metric != "ph" {
            warnings.push(format!("metric '{}' has no unit", rule.metric));
        }
    }

    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}

fn print_ranges(table: &RuleTable) {
    println!("Ranges:\n");

    let max_label_len = table
        .rules()
        .iter()
        .map(|r| r.label.len() + r.metric.len() + 3)
        .max()
        .unwrap_or(10);

    println!(
        "  {:<width$}  {:<10}  {:<10}  Unit",
        "Metric",
        "Min",
        "Max",
        width = max_label_len
    );
    println!("  {}", "-".repeat(max_label_len + 30));

    for rule in table.rules() {
        let name = format!("{} ({})", rule.label, rule.metric);
        println!(
            "  {:<width$}  {:<10}  {:<10}  {}",
            name,
            rule.min.to_string(),
            rule.max.to_string(),
            if rule.unit.is_empty() { "-" } else { rule.unit.as_str() },
            width = max_label_len
        );
    }
    println!();
}
