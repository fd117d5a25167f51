use chrono::{DateTime, Duration, Utc};
use futures::future::BoxFuture;
use hawkdash::types::{AlertIncident, Monitor, MonitorGroup, UptimeStats, MONITOR_TYPE_HTTP};
use hawkdash::{DataProvider, FetchError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Creates a test Monitor with reasonable default values.
#[allow(dead_code)]
pub fn test_monitor(id: i64, status: bool, paused: bool) -> Monitor {
    Monitor {
        id,
        name: format!("monitor-{id}"),
        monitor_type_id: MONITOR_TYPE_HTTP,
        status,
        paused,
        url_to_check: Some(format!("https://svc-{id}.example.com")),
        check_cert_expiry: false,
        days_to_expire_cert: 0,
        monitor_status_dashboard: UptimeStats {
            uptime_24_hrs: Some(99.9),
            uptime_7_days: Some(99.5),
            uptime_30_days: Some(99.0),
            ..UptimeStats::default()
        },
    }
}

/// Creates a test Monitor carrying certificate metadata.
#[allow(dead_code)]
pub fn test_cert_monitor(id: i64, days_to_expire: i32) -> Monitor {
    Monitor {
        check_cert_expiry: true,
        days_to_expire_cert: days_to_expire,
        ..test_monitor(id, true, false)
    }
}

/// Creates a test MonitorGroup wrapping the given monitors.
#[allow(dead_code)]
pub fn test_group(id: i64, monitors: Vec<Monitor>) -> MonitorGroup {
    MonitorGroup {
        id,
        name: format!("group-{id}"),
        uptime: UptimeStats {
            uptime_24_hrs: Some(99.9),
            uptime_7_days: Some(99.5),
            ..UptimeStats::default()
        },
        monitors,
    }
}

/// Creates a test AlertIncident at `age` before `now`.
#[allow(dead_code)]
pub fn test_alert(
    id: i64,
    monitor_id: i64,
    environment: i32,
    now: DateTime<Utc>,
    age: Duration,
) -> AlertIncident {
    AlertIncident {
        id,
        monitor_id,
        monitor_name: format!("monitor-{monitor_id}"),
        environment,
        time_stamp: now - age,
        status: false,
        url_to_check: None,
    }
}

/// Scripted provider for refresh and API tests: serves canned data, counts
/// fetch calls and can be flipped into a failing state.
#[allow(dead_code)]
pub struct ScriptedProvider {
    pub groups: Mutex<Vec<MonitorGroup>>,
    pub alerts: Mutex<Vec<AlertIncident>>,
    pub fetches: AtomicUsize,
    pub fail: AtomicBool,
}

#[allow(dead_code)]
impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            groups: Mutex::new(Vec::new()),
            alerts: Mutex::new(Vec::new()),
            fetches: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn with_data(groups: Vec<MonitorGroup>, alerts: Vec<AlertIncident>) -> Self {
        let provider = Self::new();
        *provider.groups.lock() = groups;
        *provider.alerts.lock() = alerts;
        provider
    }

    pub fn set_groups(&self, groups: Vec<MonitorGroup>) {
        *self.groups.lock() = groups;
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl DataProvider for ScriptedProvider {
    fn monitor_groups(&self) -> BoxFuture<'_, Result<Vec<MonitorGroup>, FetchError>> {
        Box::pin(async {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                Err(FetchError::Status {
                    status: 500,
                    url: "http://test/api/monitor/groups".to_string(),
                })
            } else {
                Ok(self.groups.lock().clone())
            }
        })
    }

    fn alerts(&self) -> BoxFuture<'_, Result<Vec<AlertIncident>, FetchError>> {
        Box::pin(async {
            if self.fail.load(Ordering::SeqCst) {
                Err(FetchError::Status {
                    status: 500,
                    url: "http://test/api/alerts".to_string(),
                })
            } else {
                Ok(self.alerts.lock().clone())
            }
        })
    }
}
