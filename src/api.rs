use crate::canvas::{CanvasError, DashboardCanvas, RenderedWidget, WidgetPatch};
use crate::live_store::LiveDataStore;
use crate::notifications::NotificationHub;
use crate::storage::LocalStore;
use crate::widget_config::SavedDashboard;
use crate::widgets::{registry, WidgetKind};
use axum::extract::ws::{Message, WebSocket};
use axum::{
    extract::{Path, State, WebSocketUpgrade},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

/// Helper to safely serialize outbound WebSocket messages.
/// Returns None if serialization fails, allowing graceful error handling.
fn serialize_ws_message<T: Serialize>(data: &T) -> Option<String> {
    match serde_json::to_string(data) {
        Ok(msg) => Some(msg),
        Err(e) => {
            error!("Failed to serialize WebSocket message: {}", e);
            None
        }
    }
}

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<LocalStore>,
    pub live: Arc<LiveDataStore>,
    pub hub: Arc<NotificationHub>,
}

pub fn create_api_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/data", get(get_data))
        .route("/api/refresh", post(trigger_refresh))
        .route("/api/refresh/schedule", put(set_refresh_schedule))
        .route("/api/widgets/catalog", get(get_widget_catalog))
        .route("/api/dashboards", get(list_dashboards).post(create_dashboard))
        .route(
            "/api/dashboards/:id",
            get(get_dashboard).put(update_dashboard).delete(delete_dashboard),
        )
        .route("/api/dashboards/:id/render", get(render_dashboard))
        .route("/api/dashboards/:id/widgets", post(add_widget))
        .route(
            "/api/dashboards/:id/widgets/:widget_id",
            axum::routing::patch(patch_widget).delete(remove_widget),
        )
        .route("/api/ws", get(websocket_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn canvas_error_status(e: &CanvasError) -> StatusCode {
    match e {
        CanvasError::WidgetLimitReached => StatusCode::CONFLICT,
        CanvasError::WidgetNotFound(_) | CanvasError::DashboardNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        CanvasError::Store(inner) => {
            error!("Storage failure: {inner}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn canvas_error_response(e: CanvasError) -> (StatusCode, Json<serde_json::Value>) {
    (
        canvas_error_status(&e),
        Json(serde_json::json!({ "error": e.to_string() })),
    )
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "hawkdash",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Current shared snapshot. 503 until the first successful refresh.
async fn get_data(State(state): State<ApiState>) -> Result<impl IntoResponse, StatusCode> {
    match state.live.snapshot() {
        Some(data) => Ok(Json((*data).clone())),
        None => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}

/// Manual retry: forces a fetch cycle outside the timer.
async fn trigger_refresh(State(state): State<ApiState>) -> Result<impl IntoResponse, StatusCode> {
    match state.live.refresh().await {
        Ok(data) => Ok(Json(serde_json::json!({
            "fetchedAt": data.fetched_at,
            "groups": data.monitor_groups.len(),
            "alerts": data.alerts.len(),
        }))),
        Err(e) => {
            warn!("Manual refresh failed: {e}");
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshScheduleRequest {
    /// `null` disables auto-refresh entirely.
    interval_seconds: Option<u64>,
}

async fn set_refresh_schedule(
    State(state): State<ApiState>,
    Json(req): Json<RefreshScheduleRequest>,
) -> impl IntoResponse {
    state.live.schedule_refresh(req.interval_seconds);
    info!(interval = ?req.interval_seconds, "refresh schedule updated");
    Json(serde_json::json!({ "enabled": state.live.refresh_enabled() }))
}

/// The widget kinds a client can add, with their defaults.
async fn get_widget_catalog() -> impl IntoResponse {
    let catalog: Vec<_> = registry()
        .iter()
        .map(|desc| {
            serde_json::json!({
                "type": desc.kind,
                "defaultTitle": desc.default_title,
                "dataSource": desc.data_source,
                "defaultSpan": desc.default_span,
            })
        })
        .collect();
    Json(serde_json::json!({ "widgets": catalog }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardSummary {
    id: String,
    name: String,
    widget_count: usize,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl From<&SavedDashboard> for DashboardSummary {
    fn from(d: &SavedDashboard) -> Self {
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            widget_count: d.widgets.len(),
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

async fn list_dashboards(State(state): State<ApiState>) -> Result<impl IntoResponse, StatusCode> {
    match state.store.load_dashboards().await {
        Ok(dashboards) => {
            let summaries: Vec<DashboardSummary> =
                dashboards.iter().map(DashboardSummary::from).collect();
            Ok(Json(serde_json::json!({ "dashboards": summaries })))
        }
        Err(e) => {
            error!("Failed to list dashboards: {e}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[derive(Deserialize)]
struct CreateDashboardRequest {
    name: String,
}

async fn create_dashboard(
    State(state): State<ApiState>,
    Json(req): Json<CreateDashboardRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let mut canvas = DashboardCanvas::new(req.name);
    let id = canvas
        .save(&state.store)
        .await
        .map_err(canvas_error_response)?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

async fn get_dashboard(
    Path(id): Path<String>,
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let dashboards = state
        .store
        .load_dashboards()
        .await
        .map_err(|e| canvas_error_response(CanvasError::Store(e)))?;
    match dashboards.into_iter().find(|d| d.id == id) {
        Some(dashboard) => Ok(Json(dashboard)),
        None => Err(canvas_error_response(CanvasError::DashboardNotFound(id))),
    }
}

#[derive(Deserialize)]
struct UpdateDashboardRequest {
    name: Option<String>,
}

async fn update_dashboard(
    Path(id): Path<String>,
    State(state): State<ApiState>,
    Json(req): Json<UpdateDashboardRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let mut canvas = load_canvas(&state, &id).await?;
    if let Some(name) = req.name {
        canvas.rename(name);
    }
    canvas
        .save(&state.store)
        .await
        .map_err(canvas_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_dashboard(
    Path(id): Path<String>,
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    DashboardCanvas::delete(&state.store, &id)
        .await
        .map_err(canvas_error_response)?;
    info!("Deleted dashboard {id}");
    Ok(StatusCode::NO_CONTENT)
}

/// Renders every widget of a saved dashboard against the live snapshot.
/// 503 until the first refresh succeeds, like `/api/data`.
async fn render_dashboard(
    Path(id): Path<String>,
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let canvas = load_canvas(&state, &id).await?;
    let Some(data) = state.live.snapshot() else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "no data fetched yet" })),
        ));
    };
    let rendered: Vec<RenderedWidget> = canvas.render_all(&data, Utc::now());
    Ok(Json(serde_json::json!({
        "id": canvas.id(),
        "name": canvas.name(),
        "fetchedAt": data.fetched_at,
        "widgets": rendered,
    })))
}

#[derive(Deserialize)]
struct AddWidgetRequest {
    #[serde(rename = "type")]
    kind: WidgetKind,
}

async fn add_widget(
    Path(id): Path<String>,
    State(state): State<ApiState>,
    Json(req): Json<AddWidgetRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let mut canvas = load_canvas(&state, &id).await?;
    let widget = canvas
        .add_widget(req.kind)
        .map_err(canvas_error_response)?
        .clone();
    canvas
        .save(&state.store)
        .await
        .map_err(canvas_error_response)?;
    Ok((StatusCode::CREATED, Json(widget)))
}

async fn patch_widget(
    Path((id, widget_id)): Path<(String, String)>,
    State(state): State<ApiState>,
    Json(patch): Json<WidgetPatch>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let mut canvas = load_canvas(&state, &id).await?;
    let widget = canvas
        .update_widget(&widget_id, patch)
        .map_err(canvas_error_response)?
        .clone();
    canvas
        .save(&state.store)
        .await
        .map_err(canvas_error_response)?;
    Ok(Json(widget))
}

async fn remove_widget(
    Path((id, widget_id)): Path<(String, String)>,
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let mut canvas = load_canvas(&state, &id).await?;
    canvas
        .remove_widget(&widget_id)
        .map_err(canvas_error_response)?;
    canvas
        .save(&state.store)
        .await
        .map_err(canvas_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn load_canvas(
    state: &ApiState,
    id: &str,
) -> Result<DashboardCanvas, (StatusCode, Json<serde_json::Value>)> {
    DashboardCanvas::load(&state.store, id)
        .await
        .map_err(canvas_error_response)
}

// WebSocket message types for client communication
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum WebSocketRequest {
    JoinGroup { group: String },
    #[serde(rename_all = "camelCase")]
    JoinMonitorGroup { monitor_id: i64 },
    JoinEnvironmentGroup { environment: i32 },
    JoinRegionGroup { region: String },
    GetRecent { limit: Option<usize> },
    Ping,
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<ApiState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

async fn handle_websocket(mut socket: WebSocket, state: ApiState) {
    info!("WebSocket client connected");

    // Greeting carries the catch-up buffer so a reconnecting client does not
    // miss notifications published while it was away.
    let greeting = serde_json::json!({
        "type": "connected",
        "recent": state.hub.recent(Some(50)),
        "stats": state.hub.stats(),
    });
    if let Some(msg) = serialize_ws_message(&greeting) {
        if socket.send(Message::Text(msg)).await.is_err() {
            return;
        }
    }

    let mut notifications = state.hub.subscribe_all();
    let mut refreshes = state.live.subscribe();

    loop {
        tokio::select! {
            notification = notifications.recv() => {
                match notification {
                    Ok(notification) => {
                        let frame = serde_json::json!({
                            "type": "notification",
                            "data": &*notification,
                        });
                        if let Some(msg) = serialize_ws_message(&frame) {
                            if socket.send(Message::Text(msg)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!("WebSocket client lagged, skipped {n} notifications");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            update = refreshes.recv() => {
                match update {
                    Ok(update) => {
                        let frame = serde_json::json!({
                            "type": "refresh",
                            "data": update,
                        });
                        if let Some(msg) = serialize_ws_message(&frame) {
                            if socket.send(Message::Text(msg)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            message = socket.recv() => {
                let Some(Ok(message)) = message else { break };
                match message {
                    Message::Text(text) => {
                        match serde_json::from_str::<WebSocketRequest>(&text) {
                            Ok(request) => {
                                if !handle_ws_request(&mut socket, &state, &mut notifications, request).await {
                                    break;
                                }
                            }
                            Err(e) => warn!("Ignoring malformed WebSocket request: {e}"),
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    }

    info!("WebSocket client disconnected");
}

/// Applies one client request. Returns false when the socket should close.
async fn handle_ws_request(
    socket: &mut WebSocket,
    state: &ApiState,
    notifications: &mut tokio::sync::broadcast::Receiver<Arc<crate::notifications::Notification>>,
    request: WebSocketRequest,
) -> bool {
    let ack = match request {
        WebSocketRequest::JoinGroup { group } => {
            *notifications = state.hub.join_group(&group);
            serde_json::json!({ "type": "joined", "group": group })
        }
        WebSocketRequest::JoinMonitorGroup { monitor_id } => {
            *notifications = state.hub.join_monitor_group(monitor_id);
            serde_json::json!({ "type": "joined", "monitorId": monitor_id })
        }
        WebSocketRequest::JoinEnvironmentGroup { environment } => {
            *notifications = state.hub.join_environment_group(environment);
            serde_json::json!({ "type": "joined", "environment": environment })
        }
        WebSocketRequest::JoinRegionGroup { region } => {
            *notifications = state.hub.join_region_group(&region);
            serde_json::json!({ "type": "joined", "region": region })
        }
        WebSocketRequest::GetRecent { limit } => {
            serde_json::json!({
                "type": "recent",
                "data": state.hub.recent(limit),
            })
        }
        WebSocketRequest::Ping => serde_json::json!({ "type": "pong" }),
    };

    match serialize_ws_message(&ack) {
        Some(msg) => socket.send(Message::Text(msg)).await.is_ok(),
        None => true,
    }
}
