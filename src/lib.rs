pub mod api;
pub mod canvas;
pub mod fetchers;
pub mod live_store;
pub mod notifications;
pub mod push;
pub mod storage;
pub mod types;
pub mod widget_config;
pub mod widgets;

pub use canvas::{DashboardCanvas, RenderedWidget, MAX_WIDGETS};
pub use fetchers::{BackendClient, BackendDataProvider, FetchError, Session};
pub use live_store::{DashboardData, DataProvider, LiveDataStore};
pub use notifications::{Notification, NotificationHub};
pub use storage::LocalStore;
pub use types::*;
pub use widget_config::{ConfigBag, DashboardWidget, GridRect, SavedDashboard};
pub use widgets::{WidgetKind, WidgetView};
