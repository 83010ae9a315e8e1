//! Notification feed behavior: snapshot seeding, push synthesis, and
//! fire-and-forget acknowledgement.

use std::sync::{Arc, Mutex};

use alcove_client::NotificationFeed;
use alcove_types::events::PushEvent;
use alcove_types::models::{Notification, NotificationKind};

fn recording_feed() -> (NotificationFeed, Arc<Mutex<Vec<Vec<String>>>>) {
    let acked = Arc::new(Mutex::new(Vec::new()));
    let sink = acked.clone();
    let feed = NotificationFeed::new(move |ids| sink.lock().unwrap().push(ids));
    (feed, acked)
}

fn snapshot_entry(id: &str, actor: &str) -> Notification {
    Notification {
        id: id.into(),
        kind: NotificationKind::NewMessage,
        actor: actor.into(),
        avatar: None,
        time_ago: "2 minutes ago".into(),
        unread: true,
    }
}

#[tokio::test]
async fn initial_snapshot_replaces_the_feed_wholesale() {
    let (feed, _) = recording_feed();

    // Anything applied before the snapshot is provisional.
    feed.apply(&PushEvent::NewMessage {
        sender_id: "u9".into(),
        sender_name: Some("Early Bird".into()),
    })
    .await;

    feed.apply(&PushEvent::InitialNotifications {
        notifications: vec![
            snapshot_entry("n1", "Alice Johnson"),
            snapshot_entry("n2", "Bob Smith"),
        ],
    })
    .await;

    let entries = feed.entries().await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, "n1");
    assert_eq!(entries[1].id, "n2");
}

#[tokio::test]
async fn push_events_prepend_newest_first() {
    let (feed, _) = recording_feed();
    feed.apply(&PushEvent::InitialNotifications {
        notifications: vec![snapshot_entry("n1", "Alice Johnson")],
    })
    .await;

    feed.apply(&PushEvent::NewMessage {
        sender_id: "u8".into(),
        sender_name: Some("Bob Smith".into()),
    })
    .await;
    feed.apply(&PushEvent::Reaction {
        reactor_id: "u9".into(),
        reactor_name: Some("Carol White".into()),
        message_id: "m5".into(),
    })
    .await;

    let entries = feed.entries().await;
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].actor, "Carol White");
    assert_eq!(entries[0].kind, NotificationKind::Reaction);
    assert_eq!(entries[1].actor, "Bob Smith");
    assert_eq!(entries[1].kind, NotificationKind::NewMessage);
    assert_eq!(entries[2].actor, "Alice Johnson");
    assert!(entries.iter().all(|n| n.unread));
}

#[tokio::test]
async fn missing_actor_name_falls_back_to_unknown() {
    let (feed, _) = recording_feed();
    feed.apply(&PushEvent::NewMessage {
        sender_id: "u8".into(),
        sender_name: None,
    })
    .await;

    let entries = feed.entries().await;
    assert_eq!(entries[0].actor, "Unknown");
}

#[tokio::test]
async fn acknowledge_removes_optimistically_and_sends_the_id() {
    let (feed, acked) = recording_feed();
    feed.apply(&PushEvent::InitialNotifications {
        notifications: vec![
            snapshot_entry("n1", "Alice Johnson"),
            snapshot_entry("n2", "Bob Smith"),
        ],
    })
    .await;

    feed.acknowledge("n1").await;

    let entries = feed.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, "n2");
    assert_eq!(*acked.lock().unwrap(), vec![vec!["n1".to_string()]]);
}

#[tokio::test]
async fn acknowledging_an_unknown_id_sends_nothing() {
    let (feed, acked) = recording_feed();
    feed.apply(&PushEvent::InitialNotifications {
        notifications: vec![snapshot_entry("n1", "Alice Johnson")],
    })
    .await;

    feed.acknowledge("n9").await;

    assert_eq!(feed.entries().await.len(), 1);
    assert!(acked.lock().unwrap().is_empty());
}

#[tokio::test]
async fn acknowledge_all_clears_the_feed_in_one_frame() {
    let (feed, acked) = recording_feed();
    feed.apply(&PushEvent::InitialNotifications {
        notifications: vec![
            snapshot_entry("n1", "Alice Johnson"),
            snapshot_entry("n2", "Bob Smith"),
        ],
    })
    .await;

    assert_eq!(feed.unread_count().await, 2);
    feed.acknowledge_all().await;

    assert!(feed.entries().await.is_empty());
    let sent = acked.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0], vec!["n1".to_string(), "n2".to_string()]);
}
