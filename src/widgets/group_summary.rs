//! Group summary grid: one row per monitor group with up/down/paused counts
//! and the group's backend-computed aggregate uptime.

use super::selected;
use crate::live_store::DashboardData;
use crate::widget_config::ConfigBag;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Default)]
pub struct GroupSummaryConfig {
    pub selected_groups: Vec<i64>,
}

impl GroupSummaryConfig {
    pub fn from_bag(bag: &ConfigBag) -> Self {
        Self {
            selected_groups: bag.get_id_list("selectedGroups"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummaryRow {
    pub group_id: i64,
    pub group_name: String,
    pub monitors_total: usize,
    pub monitors_up: usize,
    pub monitors_down: usize,
    pub monitors_paused: usize,
    pub uptime_24h: Option<f64>,
    pub uptime_7d: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummaryView {
    pub groups: Vec<GroupSummaryRow>,
}

pub fn render(data: &DashboardData, bag: &ConfigBag, _now: DateTime<Utc>) -> GroupSummaryView {
    derive(data, &GroupSummaryConfig::from_bag(bag))
}

pub fn derive(data: &DashboardData, config: &GroupSummaryConfig) -> GroupSummaryView {
    let groups = data
        .monitor_groups
        .iter()
        .filter(|g| selected(&config.selected_groups, g.id))
        .map(|group| {
            let up = group.monitors.iter().filter(|m| m.is_online()).count();
            let down = group.monitors.iter().filter(|m| m.is_offline()).count();
            let paused = group.monitors.iter().filter(|m| m.paused).count();
            GroupSummaryRow {
                group_id: group.id,
                group_name: group.name.clone(),
                monitors_total: group.monitors.len(),
                monitors_up: up,
                monitors_down: down,
                monitors_paused: paused,
                uptime_24h: group.uptime.uptime_24_hrs,
                uptime_7d: group.uptime.uptime_7_days,
            }
        })
        .collect();

    GroupSummaryView { groups }
}
