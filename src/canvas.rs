use crate::live_store::DashboardData;
use crate::storage::{LocalStore, StoreError};
use crate::widget_config::{
    new_dashboard_id, new_widget_id, ConfigBag, DashboardWidget, GridRect, SavedDashboard,
};
use crate::widgets::{descriptor, WidgetKind, WidgetView};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

/// Documented maximum number of widgets per dashboard. Adding past the cap
/// is surfaced to the user, never a silent drop and never a panic.
pub const MAX_WIDGETS: usize = 15;

#[derive(Error, Debug)]
pub enum CanvasError {
    #[error("dashboard is full: at most {MAX_WIDGETS} widgets")]
    WidgetLimitReached,
    #[error("no widget with id {0}")]
    WidgetNotFound(String),
    #[error("dashboard {0} not found")]
    DashboardNotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Partial update to a widget descriptor. Absent fields are untouched;
/// `config` is shallow-merged, not replaced.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetPatch {
    pub title: Option<String>,
    pub position: Option<GridRect>,
    pub config: Option<Map<String, Value>>,
}

/// A widget rendered against the current snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedWidget {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: WidgetKind,
    pub title: String,
    pub position: GridRect,
    pub view: WidgetView,
}

/// The Dashboard Canvas: owns the in-memory widget list, mediates widget
/// CRUD and configuration merges, and saves/loads whole dashboards against
/// the local store. The canvas is the sole mutator of the persisted widget
/// list; widgets only report configuration changes back through it.
#[derive(Debug)]
pub struct DashboardCanvas {
    id: Option<String>,
    name: String,
    widgets: Vec<DashboardWidget>,
    created_at: Option<DateTime<Utc>>,
    preview: bool,
}

impl DashboardCanvas {
    /// A fresh, unsaved dashboard.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            widgets: Vec::new(),
            created_at: None,
            preview: false,
        }
    }

    /// Rehydrates a canvas from its persisted form.
    pub fn from_saved(saved: SavedDashboard) -> Self {
        Self {
            id: Some(saved.id),
            name: saved.name,
            widgets: saved.widgets,
            created_at: Some(saved.created_at),
            preview: false,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn widgets(&self) -> &[DashboardWidget] {
        &self.widgets
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Preview mode hides per-widget edit affordances in a client; it never
    /// changes underlying data, so it is just a flag the renderer reads.
    pub fn preview(&self) -> bool {
        self.preview
    }

    pub fn set_preview(&mut self, preview: bool) {
        self.preview = preview;
    }

    /// Appends a new widget of the given kind with registry defaults and an
    /// empty config. Fails when the dashboard is at capacity.
    pub fn add_widget(&mut self, kind: WidgetKind) -> Result<&DashboardWidget, CanvasError> {
        if self.widgets.len() >= MAX_WIDGETS {
            return Err(CanvasError::WidgetLimitReached);
        }
        let desc = descriptor(kind);
        self.widgets.push(DashboardWidget {
            id: new_widget_id(),
            kind,
            title: desc.default_title.to_string(),
            data_source: desc.data_source,
            config: ConfigBag::new(),
            position: desc.default_span,
        });
        Ok(self.widgets.last().expect("just pushed"))
    }

    pub fn remove_widget(&mut self, widget_id: &str) -> Result<(), CanvasError> {
        let before = self.widgets.len();
        self.widgets.retain(|w| w.id != widget_id);
        if self.widgets.len() == before {
            return Err(CanvasError::WidgetNotFound(widget_id.to_string()));
        }
        Ok(())
    }

    fn widget_mut(&mut self, widget_id: &str) -> Result<&mut DashboardWidget, CanvasError> {
        self.widgets
            .iter_mut()
            .find(|w| w.id == widget_id)
            .ok_or_else(|| CanvasError::WidgetNotFound(widget_id.to_string()))
    }

    /// The widget's current config, or an empty bag for an unknown id — a
    /// renderer asking for config never errors.
    pub fn read_config(&self, widget_id: &str) -> ConfigBag {
        self.widgets
            .iter()
            .find(|w| w.id == widget_id)
            .map(|w| w.config.clone())
            .unwrap_or_default()
    }

    /// Shallow-merges a partial config into the widget's bag. This is the
    /// config-change callback target: every configuration-affecting user
    /// interaction lands here, and the caller re-persists immediately.
    pub fn merge_config(
        &mut self,
        widget_id: &str,
        partial: Map<String, Value>,
    ) -> Result<(), CanvasError> {
        self.widget_mut(widget_id)?.config.merge(partial);
        Ok(())
    }

    /// Applies a partial update (title, position, config merge) to a widget.
    pub fn update_widget(
        &mut self,
        widget_id: &str,
        patch: WidgetPatch,
    ) -> Result<&DashboardWidget, CanvasError> {
        let widget = self.widget_mut(widget_id)?;
        if let Some(title) = patch.title {
            widget.title = title;
        }
        if let Some(position) = patch.position {
            widget.position = position;
        }
        if let Some(partial) = patch.config {
            widget.config.merge(partial);
        }
        Ok(self.widgets.iter().find(|w| w.id == widget_id).expect("just updated"))
    }

    /// Renders every widget against the shared snapshot. Derived views are
    /// recomputed on every call, never cached.
    pub fn render_all(&self, data: &DashboardData, now: DateTime<Utc>) -> Vec<RenderedWidget> {
        self.widgets
            .iter()
            .map(|w| RenderedWidget {
                id: w.id.clone(),
                kind: w.kind,
                title: w.title.clone(),
                position: w.position,
                view: (descriptor(w.kind).render)(data, &w.config, now),
            })
            .collect()
    }

    /// Persists this dashboard, creating it on first save and updating in
    /// place (matched by id) afterwards. Saving an unchanged dashboard is a
    /// no-op so the stored representation stays byte-identical.
    pub async fn save(&mut self, store: &LocalStore) -> Result<String, CanvasError> {
        let mut dashboards = store.load_dashboards().await?;
        let now = Utc::now();

        match &self.id {
            Some(id) => {
                let Some(existing) = dashboards.iter_mut().find(|d| d.id == *id) else {
                    return Err(CanvasError::DashboardNotFound(id.clone()));
                };
                if existing.name == self.name && existing.widgets == self.widgets {
                    debug!("dashboard {id} unchanged, skipping save");
                    return Ok(id.clone());
                }
                existing.name = self.name.clone();
                existing.widgets = self.widgets.clone();
                existing.updated_at = now;
            }
            None => {
                let id = new_dashboard_id();
                dashboards.push(SavedDashboard {
                    id: id.clone(),
                    name: self.name.clone(),
                    widgets: self.widgets.clone(),
                    created_at: now,
                    updated_at: now,
                });
                self.id = Some(id);
                self.created_at = Some(now);
            }
        }

        store.save_dashboards(&dashboards).await?;
        let id = self.id.clone().expect("id set above");
        info!("Saved dashboard {id} ({} widgets)", self.widgets.len());
        Ok(id)
    }

    /// Loads a persisted dashboard by id.
    ///
    /// Missing and corrupt storage both surface as `DashboardNotFound`: the
    /// caller fails safe by redirecting to an empty/new dashboard.
    pub async fn load(store: &LocalStore, id: &str) -> Result<Self, CanvasError> {
        let dashboards = store.load_dashboards().await?;
        dashboards
            .into_iter()
            .find(|d| d.id == id)
            .map(Self::from_saved)
            .ok_or_else(|| CanvasError::DashboardNotFound(id.to_string()))
    }

    /// Deletes a persisted dashboard and all its widgets.
    pub async fn delete(store: &LocalStore, id: &str) -> Result<(), CanvasError> {
        let mut dashboards = store.load_dashboards().await?;
        let before = dashboards.len();
        dashboards.retain(|d| d.id != id);
        if dashboards.len() == before {
            return Err(CanvasError::DashboardNotFound(id.to_string()));
        }
        store.save_dashboards(&dashboards).await?;
        Ok(())
    }
}
