pub mod classify;
pub mod devices;
pub mod rules;
pub mod watch;

use crate::{ApiArgs, RuleArgs};
use aquawatch_core::error::AquaError;
use aquawatch_core::rules::{builtin, load_rule_table, RuleTable};
use aquawatch_core::source::http::HttpSource;
use std::time::Duration;

/// A custom rule file wins over the preset.
pub fn resolve_rules(args: &RuleArgs) -> Result<RuleTable, AquaError> {
    match &args.rules {
        Some(path) => load_rule_table(path),
        None => builtin::load_preset(&args.preset),
    }
}

pub fn http_source(api: &ApiArgs) -> Result<HttpSource, AquaError> {
    HttpSource::new(
        &api.base_url,
        api.token.clone(),
        Duration::from_secs(api.timeout_secs),
    )
}
