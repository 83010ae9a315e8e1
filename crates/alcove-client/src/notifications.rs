use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use alcove_types::events::PushEvent;
use alcove_types::models::{Notification, NotificationKind};

type AckSink = Box<dyn Fn(Vec<String>) + Send + Sync>;

struct FeedInner {
    /// Newest first.
    entries: RwLock<Vec<Notification>>,
    ack: AckSink,
}

/// Controller for the live notification feed.
///
/// The feed's initial state arrives as the push channel's first
/// `initial_notifications` frame and replaces the list wholesale; later
/// `new_message`/`reaction` frames synthesize entries prepended newest-first.
/// Acknowledgement is fire-and-forget: the entry is dropped locally as soon
/// as the `mark_seen` frame is queued.
#[derive(Clone)]
pub struct NotificationFeed {
    inner: Arc<FeedInner>,
}

impl NotificationFeed {
    /// `ack` carries acknowledged notification ids back over the push
    /// channel (wired to `PushChannel::send` in production).
    pub fn new(ack: impl Fn(Vec<String>) + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(FeedInner {
                entries: RwLock::new(Vec::new()),
                ack: Box::new(ack),
            }),
        }
    }

    pub async fn entries(&self) -> Vec<Notification> {
        self.inner.entries.read().await.clone()
    }

    pub async fn unread_count(&self) -> usize {
        self.inner
            .entries
            .read()
            .await
            .iter()
            .filter(|n| n.unread)
            .count()
    }

    /// Fold a push frame into the feed.
    pub async fn apply(&self, event: &PushEvent) {
        match event {
            PushEvent::InitialNotifications { notifications } => {
                // Authoritative snapshot: replace wholesale.
                let mut entries = self.inner.entries.write().await;
                *entries = notifications.clone();
                debug!("notification feed seeded with {} entries", entries.len());
            }
            PushEvent::NewMessage { .. } => {
                self.prepend(NotificationKind::NewMessage, event).await;
            }
            PushEvent::Reaction { .. } => {
                self.prepend(NotificationKind::Reaction, event).await;
            }
        }
    }

    async fn prepend(&self, kind: NotificationKind, event: &PushEvent) {
        let record = Notification {
            // Push frames carry no server-side notification id, so synthesized
            // entries get a client-generated one.
            id: Uuid::new_v4().to_string(),
            kind,
            actor: event.actor_name().unwrap_or("Unknown").to_string(),
            avatar: None,
            time_ago: "just now".to_string(),
            unread: true,
        };
        self.inner.entries.write().await.insert(0, record);
    }

    /// Mark one notification as seen: queue the acknowledgement frame and
    /// drop the entry immediately, without waiting for confirmation.
    pub async fn acknowledge(&self, notification_id: &str) {
        let removed = {
            let mut entries = self.inner.entries.write().await;
            let before = entries.len();
            entries.retain(|n| n.id != notification_id);
            entries.len() != before
        };
        if removed {
            (self.inner.ack)(vec![notification_id.to_string()]);
        }
    }

    /// Acknowledge everything currently in the feed.
    pub async fn acknowledge_all(&self) {
        let ids: Vec<String> = {
            let mut entries = self.inner.entries.write().await;
            let ids = entries.iter().map(|n| n.id.clone()).collect();
            entries.clear();
            ids
        };
        if !ids.is_empty() {
            (self.inner.ack)(ids);
        }
    }
}
