use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wire identifier of the HTTP monitor type. Certificate metadata is only
/// meaningful for monitors of this type.
pub const MONITOR_TYPE_HTTP: i32 = 1;
pub const MONITOR_TYPE_TCP: i32 = 2;
pub const MONITOR_TYPE_KUBERNETES: i32 = 3;

/// Deployment tier, integer-coded 1–6 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    QA,
    Testing,
    PreProd,
    Production,
}

impl Environment {
    /// Maps the backend's integer code to a typed environment.
    /// Returns None for codes outside 1–6 rather than guessing.
    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(Environment::Development),
            2 => Some(Environment::Staging),
            3 => Some(Environment::QA),
            4 => Some(Environment::Testing),
            5 => Some(Environment::PreProd),
            6 => Some(Environment::Production),
            _ => None,
        }
    }

    pub fn id(&self) -> i32 {
        match self {
            Environment::Development => 1,
            Environment::Staging => 2,
            Environment::QA => 3,
            Environment::Testing => 4,
            Environment::PreProd => 5,
            Environment::Production => 6,
        }
    }
}

/// Aggregate uptime percentages over the fixed look-back windows.
///
/// The backend computes these; a missing window (new monitor, no samples yet)
/// comes through as null and is treated as 0 by the widgets that average it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UptimeStats {
    #[serde(rename = "uptime1Hr")]
    pub uptime_1_hr: Option<f64>,
    #[serde(rename = "uptime24Hrs")]
    pub uptime_24_hrs: Option<f64>,
    #[serde(rename = "uptime7Days")]
    pub uptime_7_days: Option<f64>,
    #[serde(rename = "uptime30Days")]
    pub uptime_30_days: Option<f64>,
    #[serde(rename = "uptime3Months")]
    pub uptime_3_months: Option<f64>,
    #[serde(rename = "uptime6Months")]
    pub uptime_6_months: Option<f64>,
}

/// A single checked endpoint with up/down status and optional certificate
/// metadata.
///
/// `days_to_expire_cert` is only meaningful when `monitor_type_id` is HTTP
/// and `check_cert_expiry` is set; see [`Monitor::cert_eligible`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monitor {
    pub id: i64,
    pub name: String,
    pub monitor_type_id: i32,
    pub status: bool,
    pub paused: bool,
    #[serde(default)]
    pub url_to_check: Option<String>,
    #[serde(default)]
    pub check_cert_expiry: bool,
    /// Signed; zero or negative means the certificate has already expired.
    #[serde(default)]
    pub days_to_expire_cert: i32,
    #[serde(default)]
    pub monitor_status_dashboard: UptimeStats,
}

impl Monitor {
    /// Whether certificate-expiry fields carry meaning for this monitor.
    pub fn cert_eligible(&self) -> bool {
        self.monitor_type_id == MONITOR_TYPE_HTTP && self.check_cert_expiry
    }

    /// Up and actively checked.
    pub fn is_online(&self) -> bool {
        self.status && !self.paused
    }

    /// Down and actively checked.
    pub fn is_offline(&self) -> bool {
        !self.status && !self.paused
    }
}

/// A named collection of monitors with backend-computed aggregate uptime.
/// Treated as an immutable snapshot per fetch cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorGroup {
    pub id: i64,
    pub name: String,
    #[serde(flatten)]
    pub uptime: UptimeStats,
    #[serde(default)]
    pub monitors: Vec<Monitor>,
}

/// Immutable historical record of an online/offline transition.
/// Never mutated client-side, only filtered, sorted and grouped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertIncident {
    pub id: i64,
    pub monitor_id: i64,
    pub monitor_name: String,
    /// Integer environment code, 1–6. Kept raw because historical records
    /// may carry codes from environments that no longer exist.
    pub environment: i32,
    pub time_stamp: DateTime<Utc>,
    /// true = transitioned online, false = transitioned offline.
    pub status: bool,
    #[serde(default)]
    pub url_to_check: Option<String>,
}

/// Point-in-time resource-usage sample for a cluster node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetric {
    pub cluster_name: String,
    pub node_name: String,
    pub timestamp: DateTime<Utc>,
    pub cpu_cores_used: f64,
    pub cpu_cores_capacity: f64,
    pub memory_bytes_used: u64,
    pub memory_bytes_capacity: u64,
}

/// Point-in-time resource-usage sample for a pod/container in a namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceMetric {
    pub cluster_name: String,
    pub namespace: String,
    pub pod: String,
    #[serde(default)]
    pub container: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub cpu_cores_used: f64,
    pub memory_bytes_used: u64,
    #[serde(default)]
    pub cpu_cores_limit: Option<f64>,
    #[serde(default)]
    pub memory_bytes_limit: Option<u64>,
}

/// Reduce a metric series to the latest sample per entity, preserving the
/// first-seen order of entities. Summary views always want this shape;
/// time-charts keep the full series.
pub fn latest_per_entity<T, K>(
    samples: &[T],
    key: impl Fn(&T) -> K,
    timestamp: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<T>
where
    T: Clone,
    K: Eq + std::hash::Hash + Clone,
{
    let mut order: Vec<K> = Vec::new();
    let mut latest: std::collections::HashMap<K, T> = std::collections::HashMap::new();
    for sample in samples {
        let k = key(sample);
        match latest.get(&k) {
            Some(existing) if timestamp(existing) >= timestamp(sample) => {}
            Some(_) => {
                latest.insert(k, sample.clone());
            }
            None => {
                order.push(k.clone());
                latest.insert(k, sample.clone());
            }
        }
    }
    order.into_iter().filter_map(|k| latest.remove(&k)).collect()
}
