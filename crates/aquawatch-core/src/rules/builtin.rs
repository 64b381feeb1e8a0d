use crate::error::AquaError;
use crate::rules::schema::{MetricRule, RuleTableDef};
use crate::rules::RuleTable;
use rust_decimal::Decimal;
use std::sync::LazyLock;

/// Available predefined rule tables.
pub const PRESETS: &[&str] = &["standard", "pond"];

/// Name of the preset used when nothing else is configured.
pub const DEFAULT_PRESET: &str = "standard";

static STANDARD: LazyLock<RuleTable> = LazyLock::new(|| RuleTable::assemble(standard_def()));

/// The process-wide default rule table.
pub fn standard() -> &'static RuleTable {
    &STANDARD
}

/// Load a predefined rule table by name.
pub fn load_preset(name: &str) -> Result<RuleTable, AquaError> {
    match name {
        "standard" => Ok(standard().clone()),
        "pond" => RuleTable::from_def(pond_def()),
        _ => Err(AquaError::UnknownPreset {
            name: name.to_string(),
            available: PRESETS.join(", "),
        }),
    }
}

/// General water standard for every dashboard view.
fn standard_def() -> RuleTableDef {
    RuleTableDef {
        name: "Water quality standard".into(),
        description: Some("Default acceptable ranges for pond monitoring devices".into()),
        version: "1.0".into(),
        rules: vec![
            MetricRule::new("ph", Decimal::new(65, 1), Decimal::new(85, 1), "pH", ""),
            // DO below 4 mg/L is already stressful; 3.08 is the alarm line
            MetricRule::new("do", Decimal::new(308, 2), Decimal::new(20, 0), "DO", "mg/L"),
            MetricRule::new("temp", Decimal::new(25, 0), Decimal::new(30, 0), "Temp", "°C"),
            MetricRule::new("turbidity", Decimal::new(101, 0), Decimal::new(500, 0), "Turbid", "NTU"),
        ],
    }
}

/// Tighter ranges used by the water-quality history view.
fn pond_def() -> RuleTableDef {
    RuleTableDef {
        name: "Shrimp pond".into(),
        description: Some("Stricter pH and temperature bands for grow-out ponds".into()),
        version: "1.0".into(),
        rules: vec![
            MetricRule::new("ph", Decimal::new(75, 1), Decimal::new(85, 1), "pH", ""),
            MetricRule::new("do", Decimal::new(4, 0), Decimal::new(99, 0), "DO", "mg/L"),
            MetricRule::new("temp", Decimal::new(26, 0), Decimal::new(32, 0), "Temp", "°C"),
        ],
    }
}
