//! Monitor status grid: a flat per-monitor view across all groups.

use super::{all_monitors, selected};
use crate::live_store::DashboardData;
use crate::widget_config::ConfigBag;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorState {
    Online,
    Offline,
    Paused,
}

#[derive(Debug, Clone, Default)]
pub struct MonitorStatusConfig {
    pub selected_monitors: Vec<i64>,
}

impl MonitorStatusConfig {
    pub fn from_bag(bag: &ConfigBag) -> Self {
        Self {
            selected_monitors: bag.get_id_list("selectedMonitors"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatusRow {
    pub monitor_id: i64,
    pub monitor_name: String,
    pub state: MonitorState,
    pub uptime_24h: Option<f64>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatusView {
    pub monitors: Vec<MonitorStatusRow>,
    pub total: usize,
}

pub fn render(data: &DashboardData, bag: &ConfigBag, _now: DateTime<Utc>) -> MonitorStatusView {
    derive(data, &MonitorStatusConfig::from_bag(bag))
}

pub fn derive(data: &DashboardData, config: &MonitorStatusConfig) -> MonitorStatusView {
    let monitors: Vec<MonitorStatusRow> = all_monitors(data)
        .filter(|m| selected(&config.selected_monitors, m.id))
        .map(|m| {
            let state = if m.paused {
                MonitorState::Paused
            } else if m.status {
                MonitorState::Online
            } else {
                MonitorState::Offline
            };
            MonitorStatusRow {
                monitor_id: m.id,
                monitor_name: m.name.clone(),
                state,
                uptime_24h: m.monitor_status_dashboard.uptime_24_hrs,
                url: m.url_to_check.clone(),
            }
        })
        .collect();

    let total = monitors.len();
    MonitorStatusView { monitors, total }
}
