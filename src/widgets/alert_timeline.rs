//! Alert timeline: time-window and environment filtering over the alert
//! history, plus a "top monitors by alert count" ranking.

use super::selected;
use crate::live_store::DashboardData;
use crate::types::AlertIncident;
use crate::widget_config::ConfigBag;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Default ranking depth when `topMonitorsCount` is unset or unusable.
const DEFAULT_TOP_COUNT: usize = 5;

/// Look-back window for the timeline. Default is 24 hours when unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeRange {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
}

impl TimeRange {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1h" => Some(TimeRange::OneHour),
            "24h" => Some(TimeRange::Day),
            "7d" => Some(TimeRange::Week),
            "30d" => Some(TimeRange::Month),
            _ => None,
        }
    }

    pub fn lookback(&self) -> Duration {
        match self {
            TimeRange::OneHour => Duration::hours(1),
            TimeRange::Day => Duration::hours(24),
            TimeRange::Week => Duration::days(7),
            TimeRange::Month => Duration::days(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlertTimelineConfig {
    pub time_range: TimeRange,
    pub selected_environments: Vec<i64>,
    pub top_monitors_count: usize,
}

impl Default for AlertTimelineConfig {
    fn default() -> Self {
        Self {
            time_range: TimeRange::Day,
            selected_environments: Vec::new(),
            top_monitors_count: DEFAULT_TOP_COUNT,
        }
    }
}

impl AlertTimelineConfig {
    pub fn from_bag(bag: &ConfigBag) -> Self {
        let time_range = bag
            .get_str("timeRange")
            .and_then(TimeRange::parse)
            .unwrap_or(TimeRange::Day);
        let top_monitors_count = match bag.get_u64("topMonitorsCount") {
            Some(n) if n > 0 => n as usize,
            _ => DEFAULT_TOP_COUNT,
        };
        Self {
            time_range,
            selected_environments: bag.get_id_list("selectedEnvironments"),
            top_monitors_count,
        }
    }
}

/// One row of the "most alerts" ranking, keyed by (monitor, environment).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopMonitorEntry {
    pub monitor_id: i64,
    pub monitor_name: String,
    pub environment: i32,
    pub alert_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertTimelineView {
    pub time_range: TimeRange,
    pub total_alerts: usize,
    /// Filtered alerts, newest first.
    pub alerts: Vec<AlertIncident>,
    pub top_monitors: Vec<TopMonitorEntry>,
}

pub fn render(data: &DashboardData, bag: &ConfigBag, now: DateTime<Utc>) -> AlertTimelineView {
    derive(data, &AlertTimelineConfig::from_bag(bag), now)
}

pub fn derive(
    data: &DashboardData,
    config: &AlertTimelineConfig,
    now: DateTime<Utc>,
) -> AlertTimelineView {
    let cutoff = now - config.time_range.lookback();

    // Filter in original array order; the ranking's tie-break depends on it.
    let filtered: Vec<&AlertIncident> = data
        .alerts
        .iter()
        .filter(|a| a.time_stamp >= cutoff)
        .filter(|a| selected(&config.selected_environments, i64::from(a.environment)))
        .collect();

    let top_monitors = rank_top_monitors(&filtered, config.top_monitors_count);

    let mut alerts: Vec<AlertIncident> = filtered.into_iter().cloned().collect();
    alerts.sort_by(|a, b| b.time_stamp.cmp(&a.time_stamp));

    AlertTimelineView {
        time_range: config.time_range,
        total_alerts: alerts.len(),
        alerts,
        top_monitors,
    }
}

/// Group alerts by (monitor, environment), count, sort descending by count
/// and truncate to `limit`. Ties keep first-seen order of the key: the sort
/// is stable and only compares counts.
fn rank_top_monitors(alerts: &[&AlertIncident], limit: usize) -> Vec<TopMonitorEntry> {
    let mut entries: Vec<TopMonitorEntry> = Vec::new();
    for alert in alerts {
        match entries
            .iter_mut()
            .find(|e| e.monitor_id == alert.monitor_id && e.environment == alert.environment)
        {
            Some(entry) => entry.alert_count += 1,
            None => entries.push(TopMonitorEntry {
                monitor_id: alert.monitor_id,
                monitor_name: alert.monitor_name.clone(),
                environment: alert.environment,
                alert_count: 1,
            }),
        }
    }
    entries.sort_by(|a, b| b.alert_count.cmp(&a.alert_count));
    entries.truncate(limit);
    entries
}
