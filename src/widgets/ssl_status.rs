//! SSL certificate status panel.
//!
//! Only monitors with `monitorTypeId == HTTP` and `checkCertExpiry` set are
//! eligible; for those, `daysToExpireCert` buckets into exactly one of four
//! health classes. Counts are derived on render, never stored.

use super::{all_monitors, selected};
use crate::live_store::DashboardData;
use crate::widget_config::ConfigBag;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Bucket thresholds in days. Critical renders with the same color as
/// expired in the original UI, but stays a distinct bucket.
const CRITICAL_DAYS: i32 = 7;
const WARNING_DAYS: i32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CertHealth {
    Expired,
    Critical,
    Warning,
    Healthy,
}

/// Bucket a certificate by days to expiry. Zero or negative means expired.
pub fn classify_cert(days_to_expire: i32) -> CertHealth {
    if days_to_expire <= 0 {
        CertHealth::Expired
    } else if days_to_expire < CRITICAL_DAYS {
        CertHealth::Critical
    } else if days_to_expire < WARNING_DAYS {
        CertHealth::Warning
    } else {
        CertHealth::Healthy
    }
}

/// Human-readable expiry label. An expired certificate reads "Expired"
/// rather than a negative day count.
pub fn expiry_label(days_to_expire: i32) -> String {
    if days_to_expire <= 0 {
        "Expired".to_string()
    } else if days_to_expire == 1 {
        "1 day".to_string()
    } else {
        format!("{days_to_expire} days")
    }
}

#[derive(Debug, Clone, Default)]
pub struct SslStatusConfig {
    pub selected_monitors: Vec<i64>,
}

impl SslStatusConfig {
    pub fn from_bag(bag: &ConfigBag) -> Self {
        Self {
            selected_monitors: bag.get_id_list("selectedMonitors"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SslRow {
    pub monitor_id: i64,
    pub monitor_name: String,
    pub days_to_expire: i32,
    pub health: CertHealth,
    pub label: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SslCounts {
    pub expired: usize,
    pub critical: usize,
    pub warning: usize,
    pub healthy: usize,
}

impl SslCounts {
    pub fn total(&self) -> usize {
        self.expired + self.critical + self.warning + self.healthy
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SslStatusView {
    pub monitors: Vec<SslRow>,
    pub counts: SslCounts,
}

pub fn render(data: &DashboardData, bag: &ConfigBag, _now: DateTime<Utc>) -> SslStatusView {
    derive(data, &SslStatusConfig::from_bag(bag))
}

pub fn derive(data: &DashboardData, config: &SslStatusConfig) -> SslStatusView {
    let mut counts = SslCounts::default();
    let mut rows = Vec::new();

    for monitor in all_monitors(data)
        .filter(|m| m.cert_eligible())
        .filter(|m| selected(&config.selected_monitors, m.id))
    {
        let health = classify_cert(monitor.days_to_expire_cert);
        match health {
            CertHealth::Expired => counts.expired += 1,
            CertHealth::Critical => counts.critical += 1,
            CertHealth::Warning => counts.warning += 1,
            CertHealth::Healthy => counts.healthy += 1,
        }
        rows.push(SslRow {
            monitor_id: monitor.id,
            monitor_name: monitor.name.clone(),
            days_to_expire: monitor.days_to_expire_cert,
            health,
            label: expiry_label(monitor.days_to_expire_cert),
        });
    }

    SslStatusView {
        monitors: rows,
        counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Monitor, MonitorGroup, UptimeStats, MONITOR_TYPE_HTTP, MONITOR_TYPE_TCP,
    };

    fn cert_monitor(id: i64, days: i32) -> Monitor {
        Monitor {
            id,
            name: format!("m{id}"),
            monitor_type_id: MONITOR_TYPE_HTTP,
            status: true,
            paused: false,
            url_to_check: Some("https://example.com".to_string()),
            check_cert_expiry: true,
            days_to_expire_cert: days,
            monitor_status_dashboard: UptimeStats::default(),
        }
    }

    fn data(monitors: Vec<Monitor>) -> DashboardData {
        DashboardData {
            monitor_groups: vec![MonitorGroup {
                id: 1,
                name: "g".to_string(),
                uptime: UptimeStats::default(),
                monitors,
            }],
            alerts: Vec::new(),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(classify_cert(-5), CertHealth::Expired);
        assert_eq!(classify_cert(0), CertHealth::Expired);
        assert_eq!(classify_cert(1), CertHealth::Critical);
        assert_eq!(classify_cert(6), CertHealth::Critical);
        assert_eq!(classify_cert(7), CertHealth::Warning);
        assert_eq!(classify_cert(29), CertHealth::Warning);
        assert_eq!(classify_cert(30), CertHealth::Healthy);
        assert_eq!(classify_cert(365), CertHealth::Healthy);
    }

    #[test]
    fn test_expired_label_hides_negative_days() {
        assert_eq!(expiry_label(-5), "Expired");
        assert_eq!(expiry_label(0), "Expired");
        assert_eq!(expiry_label(1), "1 day");
        assert_eq!(expiry_label(14), "14 days");
    }

    #[test]
    fn test_counts_partition_eligible_set() {
        let d = data(vec![
            cert_monitor(1, -5),
            cert_monitor(2, 3),
            cert_monitor(3, 15),
            cert_monitor(4, 90),
            cert_monitor(5, 0),
        ]);
        let view = derive(&d, &SslStatusConfig::default());
        assert_eq!(view.counts.expired, 2);
        assert_eq!(view.counts.critical, 1);
        assert_eq!(view.counts.warning, 1);
        assert_eq!(view.counts.healthy, 1);
        assert_eq!(view.counts.total(), view.monitors.len());
    }

    #[test]
    fn test_ineligible_monitors_excluded() {
        let mut tcp = cert_monitor(1, 5);
        tcp.monitor_type_id = MONITOR_TYPE_TCP;
        let mut unchecked = cert_monitor(2, 5);
        unchecked.check_cert_expiry = false;
        let d = data(vec![tcp, unchecked, cert_monitor(3, 5)]);

        let view = derive(&d, &SslStatusConfig::default());
        assert_eq!(view.monitors.len(), 1);
        assert_eq!(view.monitors[0].monitor_id, 3);
    }

    #[test]
    fn test_selection_filter_empty_means_all() {
        let d = data(vec![cert_monitor(1, 5), cert_monitor(2, 50)]);
        let all = derive(&d, &SslStatusConfig::default());
        let explicit = derive(
            &d,
            &SslStatusConfig {
                selected_monitors: vec![1, 2],
            },
        );
        assert_eq!(all, explicit);

        let only_one = derive(
            &d,
            &SslStatusConfig {
                selected_monitors: vec![2],
            },
        );
        assert_eq!(only_one.monitors.len(), 1);
        assert_eq!(only_one.counts.healthy, 1);
    }
}
