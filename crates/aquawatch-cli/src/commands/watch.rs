use aquawatch_core::config::SessionConfig;
use aquawatch_core::error::AquaError;
use aquawatch_core::store::JsonFileStore;
use aquawatch_core::PollingSession;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::output;
use crate::{ApiArgs, RuleArgs};

pub struct WatchOptions {
    pub device: Option<String>,
    pub config: Option<PathBuf>,
    pub state_file: PathBuf,
    pub output: String,
    /// Rows of rated history to print after each successful poll (0 = off).
    pub history: usize,
}

pub async fn run(api: &ApiArgs, rule_args: &RuleArgs, options: WatchOptions) -> Result<(), AquaError> {
    let table = Arc::new(super::resolve_rules(rule_args)?);
    let config = match &options.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    let source = Arc::new(super::http_source(api)?);
    let store = Arc::new(JsonFileStore::open(&options.state_file)?);

    let session = PollingSession::new(source, store, Arc::clone(&table), config)?;
    let mut events = session.subscribe();

    match &options.device {
        Some(device_id) => session.select_device(device_id),
        None => {
            if session.start().await?.is_none() {
                println!("No devices.");
                return Ok(());
            }
        }
    }

    tracing::info!(
        device_id = session.selected_device().as_deref().unwrap_or_default(),
        table = table.name(),
        interval_secs = session.config().poll_interval_secs,
        "watching; press Ctrl-C to stop"
    );

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let result = loop {
        tokio::select! {
            _ = &mut ctrl_c => break Ok(()),
            received = events.recv() => match received {
                Ok(event) => {
                    if options.output == "json" {
                        output::json::print_line(&event)?;
                    } else {
                        output::table::print_event(&event, &table, true);
                        if options.history > 0 && !event.is_failure() {
                            let rows = session.history_statuses(&event.device_id);
                            output::table::print_history(&rows, options.history);
                        }
                    }
                    // Polling has stopped; nothing more will arrive
                    if let Some(e) = event.error.filter(|e| !e.is_retryable()) {
                        break Err(e.into());
                    }
                }
                Err(RecvError::Lagged(n)) => tracing::warn!(skipped = n, "output fell behind"),
                Err(RecvError::Closed) => break Ok(()),
            },
        }
    };

    session.shutdown();
    result
}
