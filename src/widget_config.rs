use crate::widgets::WidgetKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-widget configuration bag.
///
/// The persisted shape is an opaque JSON object: each renderer interprets its
/// own keys and defaults defensively when a key is absent. Mutation is a
/// shallow merge that preserves untouched keys, so independent controls in a
/// widget can write their own key without clobbering the others.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigBag(Map<String, Value>);

impl ConfigBag {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Shallow-merge `partial` over the existing config. Keys present in
    /// `partial` replace the old value wholesale; everything else is kept.
    pub fn merge(&mut self, partial: Map<String, Value>) {
        for (key, value) in partial {
            self.0.insert(key, value);
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// Reads a list of numeric identifiers. Anything that isn't an array of
    /// numbers (absent key, wrong type, mixed array) degrades to the entries
    /// that do parse — an empty result means "no filter" by convention.
    pub fn get_id_list(&self, key: &str) -> Vec<i64> {
        match self.0.get(key) {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_i64).collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for ConfigBag {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Grid coordinates and span of a widget on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Default for GridRect {
    fn default() -> Self {
        // Default span for a freshly added widget.
        Self { x: 0, y: 0, w: 4, h: 3 }
    }
}

/// Which shared dataset a widget reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataSourceKind {
    Monitors,
    Alerts,
}

/// Persisted descriptor of one widget instance on a dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardWidget {
    /// Opaque, time-based instance id.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: WidgetKind,
    pub title: String,
    pub data_source: DataSourceKind,
    #[serde(default)]
    pub config: ConfigBag,
    #[serde(default)]
    pub position: GridRect,
}

/// A named, persisted ordered list of widgets. The widget list is the sole
/// source of truth for what renders; there is no server-side dashboard state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedDashboard {
    pub id: String,
    pub name: String,
    pub widgets: Vec<DashboardWidget>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

static ID_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generates an opaque, time-based identifier. The sequence suffix keeps ids
/// unique when several are minted within the same millisecond.
pub fn new_widget_id() -> String {
    let seq = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("w{}-{:x}", Utc::now().timestamp_millis(), seq)
}

/// Same scheme for dashboard identifiers, prefixed differently so the two
/// namespaces can't collide in logs or storage keys.
pub fn new_dashboard_id() -> String {
    let seq = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("d{}-{:x}", Utc::now().timestamp_millis(), seq)
}
