//! WebSocket bridge to the backend's push channel.
//!
//! Connects to the backend, joins the configured groups, and forwards every
//! notification frame into the local [`NotificationHub`]. The bridge is a
//! pure transport: it never interprets notification contents.

use crate::notifications::{Notification, NotificationHub};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum PushError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("invalid frame: {0}")]
    InvalidFrame(#[from] serde_json::Error),
}

/// Which push groups to join after connecting.
#[derive(Debug, Clone, Default)]
pub struct PushSubscription {
    pub groups: Vec<String>,
    pub monitor_ids: Vec<i64>,
    pub environments: Vec<i32>,
    pub regions: Vec<String>,
}

impl PushSubscription {
    fn join_frames(&self) -> Vec<String> {
        let mut frames = Vec::new();
        for group in &self.groups {
            frames.push(json!({"type": "joinGroup", "group": group}).to_string());
        }
        for id in &self.monitor_ids {
            frames.push(json!({"type": "joinMonitorGroup", "monitorId": id}).to_string());
        }
        for env in &self.environments {
            frames.push(json!({"type": "joinEnvironmentGroup", "environment": env}).to_string());
        }
        for region in &self.regions {
            frames.push(json!({"type": "joinRegionGroup", "region": region}).to_string());
        }
        frames
    }
}

/// One inbound frame from the push channel.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum ServerFrame {
    Notification { data: Notification },
    Joined { group: String },
    Pong,
}

/// Parses a text frame from the push channel.
///
/// Returns the notification if the frame carried one, `None` for control
/// frames, and an error for frames that do not match the protocol at all.
fn parse_frame(text: &str) -> Result<Option<Notification>, PushError> {
    match serde_json::from_str::<ServerFrame>(text)? {
        ServerFrame::Notification { data } => Ok(Some(data)),
        ServerFrame::Joined { group } => {
            debug!("Joined push group {group}");
            Ok(None)
        }
        ServerFrame::Pong => Ok(None),
    }
}

/// Long-lived client for the backend push channel.
pub struct PushClient {
    url: String,
    subscription: PushSubscription,
    hub: Arc<NotificationHub>,
}

impl PushClient {
    pub fn new(url: impl Into<String>, subscription: PushSubscription, hub: Arc<NotificationHub>) -> Self {
        Self {
            url: url.into(),
            subscription,
            hub,
        }
    }

    /// Connects, joins the configured groups and forwards notifications into
    /// the hub until the connection closes or `shutdown` flips to true.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), PushError> {
        let (stream, _) = connect_async(self.url.as_str()).await?;
        info!("Connected to push channel at {}", self.url);
        let (mut write, mut read) = stream.split();

        for frame in self.subscription.join_frames() {
            write.send(Message::Text(frame)).await?;
        }

        loop {
            tokio::select! {
                message = read.next() => {
                    let Some(message) = message else {
                        info!("Push channel closed by backend");
                        return Ok(());
                    };
                    match message? {
                        Message::Text(text) => match parse_frame(&text) {
                            Ok(Some(notification)) => self.hub.publish(notification),
                            Ok(None) => {}
                            Err(e) => warn!("Ignoring malformed push frame: {e}"),
                        },
                        Message::Ping(payload) => {
                            write.send(Message::Pong(payload)).await?;
                        }
                        Message::Close(_) => {
                            info!("Push channel sent close frame");
                            return Ok(());
                        }
                        _ => {}
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Push client shutting down");
                        let _ = write.send(Message::Close(None)).await;
                        return Ok(());
                    }
                }
            }
        }
    }
}
