use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Size of the main notification channel.
const NOTIFICATION_CHANNEL_SIZE: usize = 4_096;

/// Size of per-group channels (smaller since filtered).
const GROUP_CHANNEL_SIZE: usize = 256;

/// Maximum number of notifications retained for catch-up on new connections.
const MAX_RETAINED_NOTIFICATIONS: usize = 500;

/// Maximum number of named group channels to maintain.
const MAX_GROUP_CHANNELS: usize = 512;

/// How often to clean up group channels with no listeners (seconds).
const CHANNEL_CLEANUP_INTERVAL: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

/// An out-of-band event pushed by the backend: a monitor went down, a
/// certificate is about to expire, and so on. Delivered at-most-once per
/// server-side send; repeated delivery is possible and not deduplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub monitor_id: Option<i64>,
    #[serde(default)]
    pub environment: Option<i32>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub group_name: Option<String>,
}

/// Channel key for a monitor-scoped subscription.
pub fn monitor_group_key(monitor_id: i64) -> String {
    format!("monitor:{monitor_id}")
}

pub fn environment_group_key(environment: i32) -> String {
    format!("env:{environment}")
}

pub fn region_group_key(region: &str) -> String {
    format!("region:{region}")
}

/// Statistics for monitoring hub health.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubStats {
    pub total_published: u64,
    pub active_subscribers: usize,
    pub group_channels: usize,
    pub buffered: usize,
    pub undelivered: u64,
}

/// Fan-out hub for realtime notifications.
///
/// One main channel carries everything; named group channels carry the
/// subset matching a monitor, environment, region or custom group, mirroring
/// the backend push channel's join semantics. Uses `parking_lot::RwLock`
/// because no critical section contains an await point.
pub struct NotificationHub {
    sender: broadcast::Sender<Arc<Notification>>,
    group_channels: Arc<RwLock<HashMap<String, broadcast::Sender<Arc<Notification>>>>>,
    /// Ring buffer of recent notifications for catch-up on new connections.
    recent: RwLock<VecDeque<Arc<Notification>>>,
    total_published: AtomicU64,
    undelivered: AtomicU64,
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(NOTIFICATION_CHANNEL_SIZE);
        let hub = Self {
            sender,
            group_channels: Arc::new(RwLock::new(HashMap::new())),
            recent: RwLock::new(VecDeque::with_capacity(MAX_RETAINED_NOTIFICATIONS)),
            total_published: AtomicU64::new(0),
            undelivered: AtomicU64::new(0),
        };
        hub.start_cleanup_task();
        hub
    }

    /// Publish a notification to every matching channel.
    pub fn publish(&self, notification: Notification) {
        let notification = Arc::new(notification);

        let receiver_count = self.sender.receiver_count();
        if self.sender.send(Arc::clone(&notification)).is_err() || receiver_count == 0 {
            // broadcast::send only fails with zero receivers; the event is
            // still buffered for catch-up.
            self.undelivered.fetch_add(1, Ordering::Relaxed);
        }
        self.total_published.fetch_add(1, Ordering::Relaxed);

        // Route to every group channel this notification belongs to.
        {
            let channels = self.group_channels.read();
            for key in Self::routing_keys(&notification) {
                if let Some(sender) = channels.get(&key) {
                    let _ = sender.send(Arc::clone(&notification));
                }
            }
        }

        let mut recent = self.recent.write();
        if recent.len() >= MAX_RETAINED_NOTIFICATIONS {
            recent.pop_front();
        }
        recent.push_back(notification);
    }

    fn routing_keys(notification: &Notification) -> Vec<String> {
        let mut keys = Vec::new();
        if let Some(id) = notification.monitor_id {
            keys.push(monitor_group_key(id));
        }
        if let Some(env) = notification.environment {
            keys.push(environment_group_key(env));
        }
        if let Some(region) = &notification.region {
            keys.push(region_group_key(region));
        }
        if let Some(group) = &notification.group_name {
            keys.push(group.clone());
        }
        keys
    }

    /// Subscribe to all notifications.
    pub fn subscribe_all(&self) -> broadcast::Receiver<Arc<Notification>> {
        self.sender.subscribe()
    }

    /// Subscribe to a named group, creating its channel on first use.
    pub fn join_group(&self, name: &str) -> broadcast::Receiver<Arc<Notification>> {
        {
            let channels = self.group_channels.read();
            if let Some(sender) = channels.get(name) {
                return sender.subscribe();
            }
        }

        let mut channels = self.group_channels.write();
        // Another task may have created it between the locks.
        if let Some(sender) = channels.get(name) {
            return sender.subscribe();
        }

        if channels.len() >= MAX_GROUP_CHANNELS {
            warn!(
                "Maximum group channels ({}) reached, joining main channel",
                MAX_GROUP_CHANNELS
            );
            return self.sender.subscribe();
        }

        let (tx, rx) = broadcast::channel(GROUP_CHANNEL_SIZE);
        channels.insert(name.to_string(), tx);
        info!("Created notification channel for group {name}");
        rx
    }

    pub fn join_monitor_group(&self, monitor_id: i64) -> broadcast::Receiver<Arc<Notification>> {
        self.join_group(&monitor_group_key(monitor_id))
    }

    pub fn join_environment_group(
        &self,
        environment: i32,
    ) -> broadcast::Receiver<Arc<Notification>> {
        self.join_group(&environment_group_key(environment))
    }

    pub fn join_region_group(&self, region: &str) -> broadcast::Receiver<Arc<Notification>> {
        self.join_group(&region_group_key(region))
    }

    /// Most recent notifications, oldest first, up to `limit`.
    pub fn recent(&self, limit: Option<usize>) -> Vec<Arc<Notification>> {
        let recent = self.recent.read();
        let limit = limit.unwrap_or(recent.len()).min(recent.len());
        let skip = recent.len() - limit;
        recent.iter().skip(skip).cloned().collect()
    }

    pub fn stats(&self) -> HubStats {
        HubStats {
            total_published: self.total_published.load(Ordering::Relaxed),
            active_subscribers: self.sender.receiver_count(),
            group_channels: self.group_channels.read().len(),
            buffered: self.recent.read().len(),
            undelivered: self.undelivered.load(Ordering::Relaxed),
        }
    }

    /// Periodically drop group channels nobody listens to.
    fn start_cleanup_task(&self) {
        let group_channels = Arc::clone(&self.group_channels);
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(CHANNEL_CLEANUP_INTERVAL));
            loop {
                interval.tick().await;
                let mut channels = group_channels.write();
                let before = channels.len();
                channels.retain(|name, sender| {
                    if sender.receiver_count() == 0 {
                        debug!("Removing idle channel for group {name}");
                        false
                    } else {
                        true
                    }
                });
                let removed = before - channels.len();
                if removed > 0 {
                    info!("Cleaned up {removed} idle notification channels");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_notification(id: &str, monitor_id: Option<i64>) -> Notification {
        Notification {
            id: id.to_string(),
            title: "Monitor down".to_string(),
            message: "checkout stopped responding".to_string(),
            kind: NotificationKind::Error,
            timestamp: chrono::Utc::now(),
            monitor_id,
            environment: Some(6),
            region: None,
            group_name: None,
        }
    }

    #[tokio::test]
    async fn test_publish_and_receive() {
        let hub = NotificationHub::new();
        let mut rx = hub.subscribe_all();
        hub.publish(make_notification("n1", None));
        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, "n1");
    }

    #[tokio::test]
    async fn test_monitor_group_filters() {
        let hub = NotificationHub::new();
        let mut rx = hub.join_monitor_group(7);

        hub.publish(make_notification("for-7", Some(7)));
        hub.publish(make_notification("for-9", Some(9)));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, "for-7");

        let next = tokio::time::timeout(std::time::Duration::from_millis(50), rx.recv()).await;
        assert!(next.is_err(), "monitor 9's notification must not arrive");
    }

    #[tokio::test]
    async fn test_environment_group_routing() {
        let hub = NotificationHub::new();
        let mut rx = hub.join_environment_group(6);
        hub.publish(make_notification("prod", None));
        assert_eq!(rx.recv().await.unwrap().id, "prod");
    }

    #[tokio::test]
    async fn test_recent_ring_buffer() {
        let hub = NotificationHub::new();
        for i in 0..(MAX_RETAINED_NOTIFICATIONS + 10) {
            hub.publish(make_notification(&format!("n{i}"), None));
        }
        let recent = hub.recent(None);
        assert_eq!(recent.len(), MAX_RETAINED_NOTIFICATIONS);
        // Oldest entries were evicted.
        assert_eq!(recent[0].id, "n10");

        let last_three = hub.recent(Some(3));
        assert_eq!(last_three.len(), 3);
        assert_eq!(last_three[2].id, format!("n{}", MAX_RETAINED_NOTIFICATIONS + 9));
    }

    #[tokio::test]
    async fn test_stats() {
        let hub = NotificationHub::new();
        let _rx = hub.subscribe_all();
        hub.publish(make_notification("n1", None));
        let stats = hub.stats();
        assert_eq!(stats.total_published, 1);
        assert_eq!(stats.active_subscribers, 1);
        assert_eq!(stats.buffered, 1);
    }

    #[test]
    fn test_notification_wire_shape() {
        let json = serde_json::json!({
            "id": "abc",
            "title": "Cert expiring",
            "message": "7 days left",
            "type": "warning",
            "timestamp": "2026-08-15T12:00:00Z",
            "monitorId": 4,
            "environment": 6
        });
        let n: Notification = serde_json::from_value(json).unwrap();
        assert_eq!(n.kind, NotificationKind::Warning);
        assert_eq!(n.monitor_id, Some(4));
        assert_eq!(n.region, None);
    }
}
