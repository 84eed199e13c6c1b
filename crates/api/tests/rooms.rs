//! Unit tests for `RoomRegistry`.
//!
//! These exercise the room bookkeeping directly, without any HTTP
//! upgrades: join/leave idempotence, broadcast delivery with and without
//! sender exclusion, implicit leave on disconnect, and graceful shutdown.

use axum::extract::ws::Message;
use tokio::sync::mpsc;

use atelier_api::ws::protocol::ServerEvent;
use atelier_api::ws::RoomRegistry;

/// Open a fake connection: register a sender, keep the receiver.
async fn connect(registry: &RoomRegistry, conn_id: &str) -> mpsc::UnboundedReceiver<Message> {
    let (tx, rx) = mpsc::unbounded_channel();
    registry.connect(conn_id.to_string(), tx).await;
    rx
}

fn annotation_event(project: uuid::Uuid) -> ServerEvent {
    ServerEvent::AnnotationNew {
        project_id: project,
        annotation: serde_json::json!({ "tool": "pen" }),
    }
}

fn frame_json(message: Message) -> serde_json::Value {
    match message {
        Message::Text(text) => serde_json::from_str(&text).expect("frame is JSON"),
        other => panic!("expected a text frame, got: {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Test: connection bookkeeping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn connect_and_disconnect_update_the_count() {
    let registry = RoomRegistry::new();
    assert_eq!(registry.connection_count().await, 0);

    let _rx = connect(&registry, "conn-1").await;
    assert_eq!(registry.connection_count().await, 1);

    registry.disconnect("conn-1").await;
    assert_eq!(registry.connection_count().await, 0);
}

// ---------------------------------------------------------------------------
// Test: join is idempotent
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rejoining_a_room_is_a_noop() {
    let registry = RoomRegistry::new();
    let project = uuid::Uuid::new_v4();
    let _rx = connect(&registry, "conn-1").await;

    registry.join(project, "conn-1").await;
    registry.join(project, "conn-1").await;

    assert_eq!(registry.room_size(project).await, 1);
}

// ---------------------------------------------------------------------------
// Test: leave is idempotent
// ---------------------------------------------------------------------------

#[tokio::test]
async fn leaving_twice_is_a_noop() {
    let registry = RoomRegistry::new();
    let project = uuid::Uuid::new_v4();
    let _rx = connect(&registry, "conn-1").await;

    registry.join(project, "conn-1").await;
    registry.leave(project, "conn-1").await;
    registry.leave(project, "conn-1").await;

    assert_eq!(registry.room_size(project).await, 0);
}

// ---------------------------------------------------------------------------
// Test: joining an unknown connection is ignored
// ---------------------------------------------------------------------------

#[tokio::test]
async fn join_without_connection_is_ignored() {
    let registry = RoomRegistry::new();
    let project = uuid::Uuid::new_v4();

    registry.join(project, "ghost").await;

    assert_eq!(registry.room_size(project).await, 0);
}

// ---------------------------------------------------------------------------
// Test: broadcast reaches every room member
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcast_reaches_all_members() {
    let registry = RoomRegistry::new();
    let project = uuid::Uuid::new_v4();

    let mut rx1 = connect(&registry, "conn-1").await;
    let mut rx2 = connect(&registry, "conn-2").await;
    registry.join(project, "conn-1").await;
    registry.join(project, "conn-2").await;

    registry.broadcast(project, &annotation_event(project), None).await;

    let frame1 = frame_json(rx1.recv().await.expect("conn-1 should receive"));
    let frame2 = frame_json(rx2.recv().await.expect("conn-2 should receive"));
    assert_eq!(frame1["event"], "annotation:new");
    assert_eq!(frame2["event"], "annotation:new");
    assert_eq!(frame1["data"]["annotation"]["tool"], "pen");
}

// ---------------------------------------------------------------------------
// Test: broadcast excludes the originating connection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcast_can_exclude_the_sender() {
    let registry = RoomRegistry::new();
    let project = uuid::Uuid::new_v4();

    let mut rx1 = connect(&registry, "conn-1").await;
    let mut rx2 = connect(&registry, "conn-2").await;
    registry.join(project, "conn-1").await;
    registry.join(project, "conn-2").await;

    registry
        .broadcast(project, &annotation_event(project), Some("conn-1"))
        .await;

    assert!(rx2.recv().await.is_some(), "conn-2 should receive");
    assert!(
        rx1.try_recv().is_err(),
        "the excluded sender must not receive its own event"
    );
}

// ---------------------------------------------------------------------------
// Test: broadcasts stay inside their room
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcast_does_not_cross_rooms() {
    let registry = RoomRegistry::new();
    let project_a = uuid::Uuid::new_v4();
    let project_b = uuid::Uuid::new_v4();

    let mut rx1 = connect(&registry, "conn-1").await;
    let mut rx2 = connect(&registry, "conn-2").await;
    registry.join(project_a, "conn-1").await;
    registry.join(project_b, "conn-2").await;

    registry.broadcast(project_a, &annotation_event(project_a), None).await;

    assert!(rx1.recv().await.is_some());
    assert!(rx2.try_recv().is_err(), "other rooms must not receive");
}

// ---------------------------------------------------------------------------
// Test: broadcast skips closed channels without panicking
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcast_skips_closed_channels() {
    let registry = RoomRegistry::new();
    let project = uuid::Uuid::new_v4();

    let rx1 = connect(&registry, "conn-1").await;
    let mut rx2 = connect(&registry, "conn-2").await;
    registry.join(project, "conn-1").await;
    registry.join(project, "conn-2").await;

    // Drop rx1 to close its channel.
    drop(rx1);

    registry.broadcast(project, &annotation_event(project), None).await;

    assert!(rx2.recv().await.is_some(), "conn-2 should still receive");
}

// ---------------------------------------------------------------------------
// Test: disconnect implicitly leaves every joined room
// ---------------------------------------------------------------------------

#[tokio::test]
async fn disconnect_leaves_all_rooms() {
    let registry = RoomRegistry::new();
    let project_a = uuid::Uuid::new_v4();
    let project_b = uuid::Uuid::new_v4();

    let _rx = connect(&registry, "conn-1").await;
    registry.join(project_a, "conn-1").await;
    registry.join(project_b, "conn-1").await;
    assert_eq!(registry.room_size(project_a).await, 1);
    assert_eq!(registry.room_size(project_b).await, 1);

    registry.disconnect("conn-1").await;

    assert_eq!(registry.room_size(project_a).await, 0);
    assert_eq!(registry.room_size(project_b).await, 0);
}

// ---------------------------------------------------------------------------
// Test: shutdown_all sends Close and clears all state
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let registry = RoomRegistry::new();
    let project = uuid::Uuid::new_v4();

    let mut rx1 = connect(&registry, "conn-1").await;
    let mut rx2 = connect(&registry, "conn-2").await;
    registry.join(project, "conn-1").await;

    registry.shutdown_all().await;

    assert_eq!(registry.connection_count().await, 0);
    assert_eq!(registry.room_size(project).await, 0);

    let msg1 = rx1.recv().await.expect("rx1 should receive Close");
    assert!(matches!(msg1, Message::Close(None)));
    let msg2 = rx2.recv().await.expect("rx2 should receive Close");
    assert!(matches!(msg2, Message::Close(None)));
}
