//! Status blocks: the filtered monitor set partitioned into exactly three
//! disjoint buckets — online, offline, paused.

use super::{all_monitors, selected};
use crate::live_store::DashboardData;
use crate::widget_config::ConfigBag;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Default)]
pub struct StatusBlocksConfig {
    pub selected_monitors: Vec<i64>,
}

impl StatusBlocksConfig {
    pub fn from_bag(bag: &ConfigBag) -> Self {
        Self {
            selected_monitors: bag.get_id_list("selectedMonitors"),
        }
    }
}

/// Percentages are omitted (None) when the total is zero rather than
/// computed from a zero division.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBlocksView {
    pub online: usize,
    pub offline: usize,
    pub paused: usize,
    pub total: usize,
    pub online_pct: Option<f64>,
    pub offline_pct: Option<f64>,
    pub paused_pct: Option<f64>,
}

pub fn render(data: &DashboardData, bag: &ConfigBag, _now: DateTime<Utc>) -> StatusBlocksView {
    derive(data, &StatusBlocksConfig::from_bag(bag))
}

pub fn derive(data: &DashboardData, config: &StatusBlocksConfig) -> StatusBlocksView {
    let mut online = 0usize;
    let mut offline = 0usize;
    let mut paused = 0usize;

    for monitor in all_monitors(data).filter(|m| selected(&config.selected_monitors, m.id)) {
        if monitor.paused {
            paused += 1;
        } else if monitor.status {
            online += 1;
        } else {
            offline += 1;
        }
    }

    let total = online + offline + paused;
    let pct = |count: usize| {
        (total > 0).then(|| count as f64 / total as f64 * 100.0)
    };

    StatusBlocksView {
        online,
        offline,
        paused,
        total,
        online_pct: pct(online),
        offline_pct: pct(offline),
        paused_pct: pct(paused),
    }
}
