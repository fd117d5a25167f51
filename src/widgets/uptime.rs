//! Uptime metric card: arithmetic mean of per-monitor uptime over the
//! filtered set, with a 7d-vs-30d trend classification.

use super::{all_monitors, selected};
use crate::live_store::DashboardData;
use crate::widget_config::ConfigBag;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Trend moves more than one percentage point to count as a direction.
const TREND_THRESHOLD: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// Classify `mean(7d) − mean(30d)` into a trend direction.
pub fn classify_trend(diff: f64) -> Trend {
    if diff > TREND_THRESHOLD {
        Trend::Up
    } else if diff < -TREND_THRESHOLD {
        Trend::Down
    } else {
        Trend::Stable
    }
}

#[derive(Debug, Clone, Default)]
pub struct UptimeMetricConfig {
    pub selected_monitors: Vec<i64>,
}

impl UptimeMetricConfig {
    pub fn from_bag(bag: &ConfigBag) -> Self {
        Self {
            selected_monitors: bag.get_id_list("selectedMonitors"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UptimeSummary {
    pub monitor_count: usize,
    pub mean_uptime_24h: f64,
    pub mean_uptime_7d: f64,
    pub mean_uptime_30d: f64,
    pub trend: Trend,
}

/// `summary` is None when the filtered set is empty: the widget renders an
/// explicit empty state instead of dividing by zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UptimeMetricView {
    pub summary: Option<UptimeSummary>,
}

pub fn render(data: &DashboardData, bag: &ConfigBag, _now: DateTime<Utc>) -> UptimeMetricView {
    derive(data, &UptimeMetricConfig::from_bag(bag))
}

pub fn derive(data: &DashboardData, config: &UptimeMetricConfig) -> UptimeMetricView {
    let monitors: Vec<_> = all_monitors(data)
        .filter(|m| selected(&config.selected_monitors, m.id))
        .collect();

    if monitors.is_empty() {
        return UptimeMetricView { summary: None };
    }

    let count = monitors.len() as f64;
    let mean = |pick: fn(&crate::types::UptimeStats) -> Option<f64>| {
        monitors
            .iter()
            .map(|m| pick(&m.monitor_status_dashboard).unwrap_or(0.0))
            .sum::<f64>()
            / count
    };

    let mean_24h = mean(|s| s.uptime_24_hrs);
    let mean_7d = mean(|s| s.uptime_7_days);
    let mean_30d = mean(|s| s.uptime_30_days);

    UptimeMetricView {
        summary: Some(UptimeSummary {
            monitor_count: monitors.len(),
            mean_uptime_24h: mean_24h,
            mean_uptime_7d: mean_7d,
            mean_uptime_30d: mean_30d,
            trend: classify_trend(mean_7d - mean_30d),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Monitor, MonitorGroup, UptimeStats, MONITOR_TYPE_HTTP};

    fn monitor(id: i64, up24: f64, up7: f64, up30: f64) -> Monitor {
        Monitor {
            id,
            name: format!("m{id}"),
            monitor_type_id: MONITOR_TYPE_HTTP,
            status: true,
            paused: false,
            url_to_check: None,
            check_cert_expiry: false,
            days_to_expire_cert: 0,
            monitor_status_dashboard: UptimeStats {
                uptime_24_hrs: Some(up24),
                uptime_7_days: Some(up7),
                uptime_30_days: Some(up30),
                ..UptimeStats::default()
            },
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
    fn test_trend_classification() {
        assert_eq!(classify_trend(1.5), Trend::Up);
        assert_eq!(classify_trend(-1.5), Trend::Down);
        assert_eq!(classify_trend(1.0), Trend::Stable);
        assert_eq!(classify_trend(-1.0), Trend::Stable);
        assert_eq!(classify_trend(0.0), Trend::Stable);
    }

    #[test]
    fn test_mean_over_filtered_set() {
        let d = data(vec![
            monitor(1, 100.0, 100.0, 90.0),
            monitor(2, 90.0, 80.0, 90.0),
        ]);
        let view = derive(&d, &UptimeMetricConfig::default());
        let summary = view.summary.unwrap();
        assert_eq!(summary.monitor_count, 2);
        assert!((summary.mean_uptime_24h - 95.0).abs() < 1e-9);
        assert!((summary.mean_uptime_7d - 90.0).abs() < 1e-9);
        assert_eq!(summary.trend, Trend::Stable);
    }

    #[test]
    fn test_empty_filtered_set_renders_empty_state() {
        let d = data(vec![monitor(1, 99.0, 99.0, 99.0)]);
        let config = UptimeMetricConfig {
            selected_monitors: vec![999],
        };
        assert!(derive(&d, &config).summary.is_none());
    }

    #[test]
    fn test_empty_selection_equals_full_selection() {
        let d = data(vec![
            monitor(1, 99.0, 98.0, 95.0),
            monitor(2, 80.0, 85.0, 90.0),
        ]);
        let unfiltered = derive(&d, &UptimeMetricConfig::default());
        let explicit = derive(
            &d,
            &UptimeMetricConfig {
                selected_monitors: vec![1, 2],
            },
        );
        assert_eq!(unfiltered, explicit);
    }
}
