//! Polling session for the selected monitoring device.
//!
//! A [`PollingSession`] owns one [`ScheduledTask`] at a time. The task fetches
//! readings for the selected device on a fixed interval, appends them to that
//! device's history and publishes a [`StatusEvent`]. Polls run sequentially
//! inside the task, so a tick that fires while a fetch is pending is skipped.
//!
//! Every poll is tagged with the device id and a selection generation.
//! Switching devices cancels the old task and bumps the generation, so a late
//! response for the previous device can never overwrite the new selection.

pub mod schedule;
pub mod state;

use crate::classify::{aggregate_device, DeviceStatus};
use crate::config::SessionConfig;
use crate::error::{AquaError, FetchError};
use crate::model::{DeviceInfo, Reading, ReadingHistory};
use crate::rules::RuleTable;
use crate::source::DataSource;
use crate::store::KeyValueStore;
use schedule::ScheduledTask;
use state::{SessionPhase, StatusEvent};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{broadcast, Notify};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub struct PollingSession {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn DataSource>,
    store: Arc<dyn KeyValueStore>,
    rules: Arc<RuleTable>,
    config: SessionConfig,
    state: Mutex<SessionState>,
    events: broadcast::Sender<StatusEvent>,
    /// Cancelled on teardown; parent of every task the session spawns.
    shutdown: CancellationToken,
}

struct SessionState {
    phase: SessionPhase,
    selected: Option<String>,
    generation: u64,
    histories: HashMap<String, ReadingHistory>,
    devices: Vec<DeviceInfo>,
    last_error: Option<FetchError>,
    poller: Option<Poller>,
}

/// The running poll task and its refresh trigger.
///
/// Each task gets its own `Notify`, so a refresh requested for one selection
/// never carries over to the next.
struct Poller {
    task: ScheduledTask,
    refresh: Arc<Notify>,
}

impl PollingSession {
    pub fn new(
        source: Arc<dyn DataSource>,
        store: Arc<dyn KeyValueStore>,
        rules: Arc<RuleTable>,
        config: SessionConfig,
    ) -> Result<Self, AquaError> {
        config.validate()?;
        let (events, _) = broadcast::channel(config.event_capacity);
        Ok(Self {
            inner: Arc::new(Inner {
                source,
                store,
                rules,
                config,
                state: Mutex::new(SessionState {
                    phase: SessionPhase::Idle,
                    selected: None,
                    generation: 0,
                    histories: HashMap::new(),
                    devices: Vec::new(),
                    last_error: None,
                    poller: None,
                }),
                events,
                shutdown: CancellationToken::new(),
            }),
        })
    }

    /// List devices and select the last used one, or the first listed.
    ///
    /// Returns the selected device id, or `None` (session stays idle) when the
    /// source reports no devices.
    pub async fn start(&self) -> Result<Option<String>, AquaError> {
        let devices = self.list_devices().await?;
        let remembered = self.inner.store.get(&self.inner.config.last_device_key);

        let choice = remembered
            .filter(|id| devices.iter().any(|d| &d.device_id == id))
            .or_else(|| devices.first().map(|d| d.device_id.clone()));

        match &choice {
            Some(device_id) => self.select_device(device_id),
            None => tracing::info!(source = self.inner.source.source_name(), "no devices available"),
        }
        Ok(choice)
    }

    /// Fetch the device list from the source (bounded by the fetch timeout).
    pub async fn list_devices(&self) -> Result<Vec<DeviceInfo>, FetchError> {
        let devices = self
            .inner
            .with_timeout(self.inner.source.list_devices())
            .await?;
        tracing::debug!(count = devices.len(), "device list refreshed");
        self.inner.lock_state().devices = devices.clone();
        Ok(devices)
    }

    /// Devices from the most recent successful [`Self::list_devices`].
    pub fn devices(&self) -> Vec<DeviceInfo> {
        self.inner.lock_state().devices.clone()
    }

    /// Select a device and start polling it immediately.
    ///
    /// Cancels the poll task of the previous selection, including a fetch in
    /// flight. Must be called from within a tokio runtime.
    pub fn select_device(&self, device_id: &str) {
        {
            let mut state = self.inner.lock_state();
            if let Some(old) = state.poller.take() {
                old.task.cancel();
            }
            state.generation += 1;
            state.selected = Some(device_id.to_string());
            state.phase = SessionPhase::Loading;
            state.last_error = None;
            state.histories.entry(device_id.to_string()).or_default();

            let inner = Arc::clone(&self.inner);
            let device = device_id.to_string();
            let generation = state.generation;
            let refresh = Arc::new(Notify::new());
            let trigger = Arc::clone(&refresh);
            let task = ScheduledTask::spawn(&self.inner.shutdown, move |cancel| {
                poll_loop(inner, device, generation, trigger, cancel)
            });
            state.poller = Some(Poller { task, refresh });
        }

        tracing::info!(
            device_id,
            interval_secs = self.inner.config.poll_interval_secs,
            "device selected"
        );

        if let Err(e) = self
            .inner
            .store
            .set(&self.inner.config.last_device_key, device_id)
        {
            tracing::warn!(device_id, error = %e, "failed to persist selected device");
        }
    }

    /// Ask the poll task to fetch now instead of waiting for the next tick.
    ///
    /// Does nothing when no poll task is running (idle, or stopped after an
    /// authorization failure).
    pub fn refresh(&self) {
        let state = self.inner.lock_state();
        match &state.poller {
            Some(poller) if !poller.task.is_finished() => poller.refresh.notify_one(),
            _ => tracing::debug!("refresh ignored; no poll task running"),
        }
    }

    /// Stop polling and return to `Idle`. Histories are kept.
    pub fn shutdown(&self) {
        let mut state = self.inner.lock_state();
        if let Some(poller) = state.poller.take() {
            poller.task.cancel();
        }
        state.generation += 1;
        state.selected = None;
        state.phase = SessionPhase::Idle;
        state.last_error = None;
        tracing::info!("polling session stopped");
    }

    pub fn phase(&self) -> SessionPhase {
        self.inner.lock_state().phase
    }

    pub fn selected_device(&self) -> Option<String> {
        self.inner.lock_state().selected.clone()
    }

    /// Error of the last poll, if it failed.
    pub fn last_error(&self) -> Option<FetchError> {
        self.inner.lock_state().last_error.clone()
    }

    /// Status of the selected device; Unknown when nothing has been received.
    pub fn current_status(&self) -> DeviceStatus {
        let state = self.inner.lock_state();
        let device_id = state.selected.clone().unwrap_or_default();
        self.inner.status_for(&state, &device_id)
    }

    /// Status of any device seen in this session.
    pub fn device_status(&self, device_id: &str) -> DeviceStatus {
        let state = self.inner.lock_state();
        self.inner.status_for(&state, device_id)
    }

    /// Snapshot of a device's reading history (empty if never polled).
    pub fn history(&self, device_id: &str) -> ReadingHistory {
        self.inner
            .lock_state()
            .histories
            .get(device_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Status of every reading in a device's history, most recent first.
    pub fn history_statuses(&self, device_id: &str) -> Vec<DeviceStatus> {
        let history = self.history(device_id);
        let mut statuses = crate::assess_readings(
            history.readings(),
            &self.inner.config.tracked_metrics,
            &self.inner.rules,
        );
        statuses.reverse();
        statuses
    }

    pub fn rules(&self) -> &RuleTable {
        &self.inner.rules
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Receive a [`StatusEvent`] after every poll.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.inner.events.subscribe()
    }

    /// Invoke `callback` after every poll until the returned handle is dropped
    /// or the session is torn down.
    pub fn on_status_change<F>(&self, callback: F) -> ScheduledTask
    where
        F: Fn(&StatusEvent) + Send + 'static,
    {
        let mut rx = self.inner.events.subscribe();
        ScheduledTask::spawn(&self.inner.shutdown, move |cancel| async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    received = rx.recv() => match received {
                        Ok(event) => callback(&event),
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(skipped = n, "status listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        })
    }
}

impl Drop for PollingSession {
    fn drop(&mut self) {
        self.inner.shutdown.cancel();
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn with_timeout<T, F>(&self, fut: F) -> Result<T, FetchError>
    where
        F: Future<Output = Result<T, FetchError>>,
    {
        match tokio::time::timeout(self.config.fetch_timeout(), fut).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                secs: self.config.fetch_timeout_secs,
            }),
        }
    }

    fn status_for(&self, state: &SessionState, device_id: &str) -> DeviceStatus {
        match state.histories.get(device_id).and_then(ReadingHistory::latest) {
            Some(latest) => aggregate_device(latest, &self.config.tracked_metrics, &self.rules),
            None => DeviceStatus::unknown(device_id, &self.config.tracked_metrics),
        }
    }

    /// Apply a poll result in one critical section and publish the event.
    ///
    /// Returns whether the poll task should keep running.
    fn apply_outcome(
        &self,
        device_id: &str,
        generation: u64,
        outcome: Result<Vec<Reading>, FetchError>,
    ) -> bool {
        let (event, keep_polling) = {
            let mut state = self.lock_state();
            if state.generation != generation || state.selected.as_deref() != Some(device_id) {
                tracing::debug!(device_id, generation, "discarding result for stale selection");
                return false;
            }

            let (new_readings, error) = match outcome {
                Ok(mut batch) => {
                    let fetched = batch.len();
                    batch.retain(|r| r.device_id == device_id);
                    let foreign = fetched - batch.len();
                    if foreign > 0 {
                        tracing::warn!(
                            device_id,
                            dropped = foreign,
                            "dropping readings tagged with another device"
                        );
                    }
                    let history = state.histories.entry(device_id.to_string()).or_default();
                    let added = history.append(batch);
                    let has_data = !history.is_empty();
                    state.phase = if has_data {
                        SessionPhase::Ready
                    } else {
                        SessionPhase::Loading
                    };
                    state.last_error = None;
                    tracing::debug!(device_id, fetched, added, "poll succeeded");
                    (added, None)
                }
                Err(e) => {
                    state.phase = SessionPhase::Error;
                    state.last_error = Some(e.clone());
                    tracing::warn!(device_id, error = %e, "poll failed");
                    (0, Some(e))
                }
            };

            let keep_polling = error.as_ref().map_or(true, FetchError::is_retryable);
            let event = StatusEvent {
                device_id: device_id.to_string(),
                phase: state.phase,
                status: self.status_for(&state, device_id),
                new_readings,
                error,
            };
            (event, keep_polling)
        };

        if !keep_polling {
            tracing::warn!(device_id, "authorization rejected; polling stopped");
        }
        // Err only means nobody is subscribed.
        let _ = self.events.send(event);
        keep_polling
    }
}

async fn poll_loop(
    inner: Arc<Inner>,
    device_id: String,
    generation: u64,
    refresh: Arc<Notify>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(inner.config.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
            _ = refresh.notified() => {}
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(device_id = %device_id, "in-flight poll cancelled");
                break;
            }
            result = inner.with_timeout(inner.source.fetch_latest_readings(&device_id)) => result,
        };

        if !inner.apply_outcome(&device_id, generation, outcome) {
            break;
        }
    }
}
