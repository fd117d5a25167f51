//! The six widget renderers and their registry.
//!
//! Every renderer is a pure function `(shared data, config, now) -> view`.
//! Configuration comes in as an opaque [`ConfigBag`]; each renderer parses
//! the keys it cares about through a typed config struct that defaults
//! defensively, so an absent or malformed key can never panic a render.
//!
//! One convention is shared by every variant: an empty selection list means
//! "no filter / show all", never "show nothing".

pub mod alert_timeline;
pub mod group_summary;
pub mod monitor_status;
pub mod ssl_status;
pub mod status_blocks;
pub mod uptime;

use crate::live_store::DashboardData;
use crate::types::Monitor;
use crate::widget_config::{ConfigBag, DataSourceKind, GridRect};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The fixed set of widget kinds a dashboard can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WidgetKind {
    UptimeMetric,
    AlertTimeline,
    GroupSummary,
    MonitorStatus,
    SslStatus,
    StatusBlocks,
}

/// Derived view of one widget, ready for serialization to a client.
/// Recomputed on demand, never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WidgetView {
    UptimeMetric(uptime::UptimeMetricView),
    AlertTimeline(alert_timeline::AlertTimelineView),
    GroupSummary(group_summary::GroupSummaryView),
    MonitorStatus(monitor_status::MonitorStatusView),
    SslStatus(ssl_status::SslStatusView),
    StatusBlocks(status_blocks::StatusBlocksView),
}

type RenderFn = fn(&DashboardData, &ConfigBag, DateTime<Utc>) -> WidgetView;

/// Static description of a widget kind: defaults applied when a user adds
/// one from the library, plus its render entry point. Adding a widget kind
/// means adding a module and one row here — no central switch to touch.
pub struct WidgetDescriptor {
    pub kind: WidgetKind,
    pub default_title: &'static str,
    pub data_source: DataSourceKind,
    pub default_span: GridRect,
    pub render: RenderFn,
}

const DEFAULT_SPAN: GridRect = GridRect { x: 0, y: 0, w: 4, h: 3 };

static REGISTRY: &[WidgetDescriptor] = &[
    WidgetDescriptor {
        kind: WidgetKind::UptimeMetric,
        default_title: "Uptime",
        data_source: DataSourceKind::Monitors,
        default_span: DEFAULT_SPAN,
        render: |data, config, now| {
            WidgetView::UptimeMetric(uptime::render(data, config, now))
        },
    },
    WidgetDescriptor {
        kind: WidgetKind::AlertTimeline,
        default_title: "Alert Timeline",
        data_source: DataSourceKind::Alerts,
        default_span: DEFAULT_SPAN,
        render: |data, config, now| {
            WidgetView::AlertTimeline(alert_timeline::render(data, config, now))
        },
    },
    WidgetDescriptor {
        kind: WidgetKind::GroupSummary,
        default_title: "Group Summary",
        data_source: DataSourceKind::Monitors,
        default_span: DEFAULT_SPAN,
        render: |data, config, now| {
            WidgetView::GroupSummary(group_summary::render(data, config, now))
        },
    },
    WidgetDescriptor {
        kind: WidgetKind::MonitorStatus,
        default_title: "Monitor Status",
        data_source: DataSourceKind::Monitors,
        default_span: DEFAULT_SPAN,
        render: |data, config, now| {
            WidgetView::MonitorStatus(monitor_status::render(data, config, now))
        },
    },
    WidgetDescriptor {
        kind: WidgetKind::SslStatus,
        default_title: "SSL Certificates",
        data_source: DataSourceKind::Monitors,
        default_span: DEFAULT_SPAN,
        render: |data, config, now| {
            WidgetView::SslStatus(ssl_status::render(data, config, now))
        },
    },
    WidgetDescriptor {
        kind: WidgetKind::StatusBlocks,
        default_title: "Status Overview",
        data_source: DataSourceKind::Monitors,
        default_span: DEFAULT_SPAN,
        render: |data, config, now| {
            WidgetView::StatusBlocks(status_blocks::render(data, config, now))
        },
    },
];

/// Look up the descriptor for a widget kind.
pub fn descriptor(kind: WidgetKind) -> &'static WidgetDescriptor {
    REGISTRY
        .iter()
        .find(|d| d.kind == kind)
        .expect("every WidgetKind has a registry entry")
}

/// All registered descriptors, in library display order.
pub fn registry() -> &'static [WidgetDescriptor] {
    REGISTRY
}

/// The shared selection convention: an empty list filters nothing.
pub(crate) fn selected(ids: &[i64], id: i64) -> bool {
    ids.is_empty() || ids.contains(&id)
}

/// Flattens the monitor-group snapshot into its monitors, preserving group
/// order then monitor order within the group.
pub(crate) fn all_monitors(data: &DashboardData) -> impl Iterator<Item = &Monitor> {
    data.monitor_groups.iter().flat_map(|g| g.monitors.iter())
}
