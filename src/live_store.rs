use crate::fetchers::FetchError;
use crate::types::{AlertIncident, MonitorGroup};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Size of the refresh-update broadcast channel. Updates are tiny and
/// consumers that lag simply miss intermediate snapshots.
const UPDATE_CHANNEL_SIZE: usize = 64;

/// The most recently fetched snapshot shared by every widget on a page.
/// Replaced wholesale on each successful fetch, never mutated in place.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub monitor_groups: Vec<MonitorGroup>,
    pub alerts: Vec<AlertIncident>,
    pub fetched_at: DateTime<Utc>,
}

/// Source of the two shared datasets.
///
/// Boxed futures keep the trait dyn-compatible so the store can hold a real
/// backend client in production and a scripted provider in tests.
pub trait DataProvider: Send + Sync {
    fn monitor_groups(&self) -> BoxFuture<'_, Result<Vec<MonitorGroup>, FetchError>>;
    fn alerts(&self) -> BoxFuture<'_, Result<Vec<AlertIncident>, FetchError>>;
}

/// Broadcast whenever a refresh lands a new snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshUpdate {
    pub fetched_at: DateTime<Utc>,
    pub group_count: usize,
    pub alert_count: usize,
}

/// Live Data Store with timer-driven refresh.
///
/// A refresh fetches monitor groups and alerts in parallel and is
/// all-or-nothing: if either fetch fails the previous snapshot is retained
/// untouched. Consumers can pull (`snapshot`) or subscribe to pushes
/// (`subscribe`); both read the same atomically replaced `Arc`.
pub struct LiveDataStore {
    provider: Arc<dyn DataProvider>,
    snapshot: RwLock<Option<Arc<DashboardData>>>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
    updates: broadcast::Sender<RefreshUpdate>,
}

impl LiveDataStore {
    pub fn new(provider: Arc<dyn DataProvider>) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_SIZE);
        Self {
            provider,
            snapshot: RwLock::new(None),
            refresh_task: Mutex::new(None),
            updates,
        }
    }

    /// The current snapshot, if any fetch has succeeded yet.
    pub fn snapshot(&self) -> Option<Arc<DashboardData>> {
        self.snapshot.read().clone()
    }

    /// Subscribe to refresh notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshUpdate> {
        self.updates.subscribe()
    }

    /// Fetch both datasets in parallel and replace the snapshot on success.
    ///
    /// Either failure surfaces as an error and leaves the store unchanged —
    /// a refresh cycle never produces a partial snapshot. Overlapping calls
    /// are tolerated; the last one to complete wins.
    pub async fn refresh(&self) -> Result<Arc<DashboardData>, FetchError> {
        let (monitor_groups, alerts) =
            futures::try_join!(self.provider.monitor_groups(), self.provider.alerts())?;

        let data = Arc::new(DashboardData {
            monitor_groups,
            alerts,
            fetched_at: Utc::now(),
        });

        *self.snapshot.write() = Some(Arc::clone(&data));

        let update = RefreshUpdate {
            fetched_at: data.fetched_at,
            group_count: data.monitor_groups.len(),
            alert_count: data.alerts.len(),
        };
        // Send fails only when nobody is subscribed, which is fine.
        let _ = self.updates.send(update);

        debug!(
            groups = data.monitor_groups.len(),
            alerts = data.alerts.len(),
            "snapshot replaced"
        );
        Ok(data)
    }

    /// Install, replace or cancel the auto-refresh timer.
    ///
    /// `None` cancels the timer; no further fetches happen until re-enabled.
    /// A non-null interval first cancels any existing timer so a change can
    /// never double-fire. The spawned loop awaits each refresh before the
    /// next tick, so an in-flight refresh is never cancelled by the timer.
    pub fn schedule_refresh(self: &Arc<Self>, interval_secs: Option<u64>) {
        match interval_secs {
            Some(secs) if secs > 0 => {
                self.schedule_refresh_every(Duration::from_secs(secs));
            }
            Some(_) => {
                warn!("ignoring zero-second refresh interval, disabling auto-refresh");
                self.cancel_refresh();
            }
            None => self.cancel_refresh(),
        }
    }

    /// Duration-granular variant of [`schedule_refresh`](Self::schedule_refresh).
    pub fn schedule_refresh_every(self: &Arc<Self>, interval: Duration) {
        let mut guard = self.refresh_task.lock();
        if let Some(handle) = guard.take() {
            handle.abort();
        }

        let store = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval completes immediately; skip
            // it so installation does not itself trigger a fetch.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = store.refresh().await {
                    // Background failure: keep the last-good snapshot and
                    // retry silently on the next tick.
                    warn!("background refresh failed, retaining previous snapshot: {e}");
                }
            }
        });
        *guard = Some(handle);
        debug!(interval_ms = interval.as_millis() as u64, "auto-refresh installed");
    }

    /// Cancel the auto-refresh timer if one is installed.
    pub fn cancel_refresh(&self) {
        if let Some(handle) = self.refresh_task.lock().take() {
            handle.abort();
            debug!("auto-refresh cancelled");
        }
    }

    /// Whether an auto-refresh timer is currently installed.
    pub fn refresh_enabled(&self) -> bool {
        self.refresh_task
            .lock()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for LiveDataStore {
    fn drop(&mut self) {
        if let Some(handle) = self.refresh_task.lock().take() {
            handle.abort();
        }
    }
}
