pub mod alias;
pub mod builtin;
pub mod schema;

use crate::error::AquaError;
use alias::{canonical_metric, is_alias};
use schema::{MetricRule, RuleTableDef};
use std::collections::HashSet;
use std::path::Path;

/// Validated, immutable mapping from canonical metric key to its range.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTable {
    name: String,
    version: String,
    description: Option<String>,
    rules: Vec<MetricRule>,
}

impl RuleTable {
    /// Build a table from a definition, validating it first.
    pub fn from_def(def: RuleTableDef) -> Result<Self, AquaError> {
        validate_rule_table(&def)?;
        Ok(Self::assemble(def))
    }

    pub(crate) fn assemble(def: RuleTableDef) -> Self {
        Self {
            name: def.name,
            version: def.version,
            description: def.description,
            rules: def.rules,
        }
    }

    /// Find the rule for a metric, resolving aliases first.
    pub fn lookup(&self, metric: &str) -> Option<&MetricRule> {
        let key = canonical_metric(metric);
        self.rules.iter().find(|r| r.metric == key)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Rules in definition order.
    pub fn rules(&self) -> &[MetricRule] {
        &self.rules
    }

    /// Canonical keys of every metric with a rule, in definition order.
    pub fn metrics(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.metric.clone()).collect()
    }
}

/// Load a rule table from a JSON file.
pub fn load_rule_table(path: &Path) -> Result<RuleTable, AquaError> {
    let content = std::fs::read_to_string(path).map_err(|e| AquaError::RuleTableLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_rule_table(&content, path)
}

/// Parse a rule table from a JSON string.
pub fn parse_rule_table(json: &str, source: &Path) -> Result<RuleTable, AquaError> {
    let def: RuleTableDef = serde_json::from_str(json).map_err(|e| AquaError::RuleTableLoad {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    RuleTable::from_def(def)
}

/// Parse a rule table from a JSON string (no file path context).
pub fn parse_rule_table_str(json: &str) -> Result<RuleTable, AquaError> {
    let def: RuleTableDef = serde_json::from_str(json).map_err(AquaError::Json)?;
    RuleTable::from_def(def)
}

/// Validate that a rule table is well-formed.
pub fn validate_rule_table(def: &RuleTableDef) -> Result<(), AquaError> {
    if def.name.trim().is_empty() {
        return Err(AquaError::RuleTableInvalid("name must not be empty".into()));
    }

    if def.rules.is_empty() {
        return Err(AquaError::RuleTableInvalid("rules must not be empty".into()));
    }

    let mut seen = HashSet::new();
    for rule in &def.rules {
        if rule.metric.is_empty() {
            return Err(AquaError::RuleTableInvalid(
                "metric key must not be empty".into(),
            ));
        }

        if is_alias(&rule.metric) {
            return Err(AquaError::RuleTableInvalid(format!(
                "metric '{}' is an alias; use the canonical key '{}'",
                rule.metric,
                canonical_metric(&rule.metric)
            )));
        }

        if !seen.insert(rule.metric.as_str()) {
            return Err(AquaError::RuleTableInvalid(format!(
                "metric '{}' is defined more than once",
                rule.metric
            )));
        }

        if rule.min > rule.max {
            return Err(AquaError::RuleTableInvalid(format!(
                "metric '{}' has min {} greater than max {}",
                rule.metric, rule.min, rule.max
            )));
        }

        if rule.label.trim().is_empty() {
            return Err(AquaError::RuleTableInvalid(format!(
                "metric '{}' has an empty label",
                rule.metric
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_valid_table() {
        let json = r#"{
            "name": "Test",
            "version": "1.0",
            "rules": [
                { "metric": "ph", "min": "6.5", "max": "8.5", "label": "pH" },
                { "metric": "do", "min": "4", "max": "99", "label": "DO", "unit": "mg/L" }
            ]
        }"#;
        let table = parse_rule_table_str(json).unwrap();
        assert_eq!(table.name(), "Test");
        assert_eq!(table.metrics(), vec!["ph", "do"]);
        let rule = table.lookup("dissolved_oxygen").unwrap();
        assert_eq!(rule.min, dec!(4));
        assert_eq!(rule.unit, "mg/L");
    }

    #[test]
    fn test_lookup_missing_is_none() {
        let json = r#"{
            "name": "Test",
            "version": "1.0",
            "rules": [ { "metric": "ph", "min": "6.5", "max": "8.5", "label": "pH" } ]
        }"#;
        let table = parse_rule_table_str(json).unwrap();
        assert!(table.lookup("salinity").is_none());
        assert!(table.lookup("PH").is_none());
    }

    #[test]
    fn test_min_above_max_rejected() {
        let json = r#"{
            "name": "Bad",
            "version": "1.0",
            "rules": [ { "metric": "ph", "min": "9", "max": "8.5", "label": "pH" } ]
        }"#;
        assert!(parse_rule_table_str(json).is_err());
    }

    #[test]
    fn test_equal_bounds_allowed() {
        let json = r#"{
            "name": "Exact",
            "version": "1.0",
            "rules": [ { "metric": "temp", "min": "28", "max": "28", "label": "Temp" } ]
        }"#;
        assert!(parse_rule_table_str(json).is_ok());
    }

    #[test]
    fn test_alias_key_rejected() {
        let json = r#"{
            "name": "Bad",
            "version": "1.0",
            "rules": [ { "metric": "temperature", "min": "25", "max": "30", "label": "Temp" } ]
        }"#;
        let err = parse_rule_table_str(json).unwrap_err();
        assert!(err.to_string().contains("canonical key 'temp'"));
    }

    #[test]
    fn test_duplicate_metric_rejected() {
        let json = r#"{
            "name": "Bad",
            "version": "1.0",
            "rules": [
                { "metric": "ph", "min": "6.5", "max": "8.5", "label": "pH" },
                { "metric": "ph", "min": "7", "max": "8", "label": "pH" }
            ]
        }"#;
        assert!(parse_rule_table_str(json).is_err());
    }

    #[test]
    fn test_empty_rules_rejected() {
        let json = r#"{ "name": "Bad", "version": "1.0", "rules": [] }"#;
        assert!(parse_rule_table_str(json).is_err());
    }

    #[test]
    fn test_load_from_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_rule_table(&path).unwrap_err();
        assert!(matches!(err, AquaError::RuleTableLoad { .. }));
        assert!(err.to_string().contains("broken.json"));
    }
}
