use std::collections::HashMap;
use std::sync::LazyLock;

/// Canonical metric keys known to the built-in rule tables, in display order.
pub const CANONICAL_METRICS: &[&str] = &["ph", "do", "temp", "turbidity"];

/// Upstream field names that refer to a canonical metric.
static METRIC_ALIASES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("dissolved_oxygen", "do"),
        ("oxygen", "do"),
        ("temperature", "temp"),
    ])
});

/// Resolve a caller-supplied metric name to its canonical key.
///
/// Matching is exact and case-sensitive. Names without an alias are returned
/// unchanged, so unknown metrics pass through to the rule lookup.
pub fn canonical_metric(name: &str) -> &str {
    METRIC_ALIASES.get(name).copied().unwrap_or(name)
}

/// Whether `name` is an alias rather than a canonical key.
pub fn is_alias(name: &str) -> bool {
    METRIC_ALIASES.contains_key(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oxygen_aliases() {
        assert_eq!(canonical_metric("dissolved_oxygen"), "do");
        assert_eq!(canonical_metric("oxygen"), "do");
        assert_eq!(canonical_metric("do"), "do");
    }

    #[test]
    fn test_temperature_alias() {
        assert_eq!(canonical_metric("temperature"), "temp");
    }

    #[test]
    fn test_unknown_passes_through() {
        assert_eq!(canonical_metric("salinity"), "salinity");
    }

    #[test]
    fn test_case_sensitive() {
        assert_eq!(canonical_metric("Temperature"), "Temperature");
        assert!(!is_alias("OXYGEN"));
        assert!(is_alias("oxygen"));
    }
}
