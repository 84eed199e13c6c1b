//! Connection and room bookkeeping for the realtime channel.
//!
//! Tracks every open WebSocket connection and, per project, the set of
//! connections currently joined to that project's room. Delivery is best
//! effort: a closed channel is skipped silently and cleaned up when its
//! connection's receive loop ends. There is no queuing, no retry, and no
//! replay for sessions that join late.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};

use atelier_core::types::Id;

use crate::ws::protocol::ServerEvent;

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Opaque per-connection id (UUID string).
pub type ConnId = String;

#[derive(Default)]
struct Inner {
    /// Every open connection.
    connections: HashMap<ConnId, WsSender>,
    /// Project id -> connections joined to that room.
    rooms: HashMap<Id, HashMap<ConnId, WsSender>>,
}

/// Maps project ids to the connections subscribed to them.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application.
#[derive(Default)]
pub struct RoomRegistry {
    inner: RwLock<Inner>,
}

impl RoomRegistry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection with its outbound sender.
    pub async fn connect(&self, conn_id: ConnId, sender: WsSender) {
        self.inner.write().await.connections.insert(conn_id, sender);
    }

    /// Remove a connection: drops it from the connection map and from
    /// every room it joined (the implicit leave on disconnect).
    pub async fn disconnect(&self, conn_id: &str) {
        let mut inner = self.inner.write().await;
        inner.connections.remove(conn_id);
        inner.rooms.retain(|_, members| {
            members.remove(conn_id);
            !members.is_empty()
        });
    }

    /// Join a connection to a project room. Idempotent: re-joining an
    /// already-joined room is a no-op. Unknown connections are ignored.
    pub async fn join(&self, project: Id, conn_id: &str) {
        let mut inner = self.inner.write().await;
        let Some(sender) = inner.connections.get(conn_id).cloned() else {
            return;
        };
        inner
            .rooms
            .entry(project)
            .or_default()
            .entry(conn_id.to_string())
            .or_insert(sender);
    }

    /// Remove a connection from a project room. Idempotent.
    pub async fn leave(&self, project: Id, conn_id: &str) {
        let mut inner = self.inner.write().await;
        if let Some(members) = inner.rooms.get_mut(&project) {
            members.remove(conn_id);
            if members.is_empty() {
                inner.rooms.remove(&project);
            }
        }
    }

    /// Number of connections currently joined to a room.
    pub async fn room_size(&self, project: Id) -> usize {
        self.inner
            .read()
            .await
            .rooms
            .get(&project)
            .map_or(0, HashMap::len)
    }

    /// Fan an event out to every connection in the room, except (when
    /// given) the originating connection. Connections whose send channels
    /// are closed are silently skipped.
    pub async fn broadcast(&self, project: Id, event: &ServerEvent, exclude: Option<&str>) {
        let inner = self.inner.read().await;
        let Some(members) = inner.rooms.get(&project) else {
            return;
        };
        let message = event.to_message();
        for (conn_id, sender) in members {
            if exclude == Some(conn_id.as_str()) {
                continue;
            }
            let _ = sender.send(message.clone());
        }
    }

    /// Return the current number of open connections.
    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.connections.len()
    }

    /// Send a Ping frame to every open connection.
    ///
    /// Used by the heartbeat task to keep connections alive and detect
    /// stale ones.
    pub async fn ping_all(&self) {
        let inner = self.inner.read().await;
        for sender in inner.connections.values() {
            let _ = sender.send(Message::Ping(Bytes::new()));
        }
    }

    /// Send a Close frame to every connection, then clear all state.
    ///
    /// Used during graceful shutdown to notify clients before the server
    /// stops accepting new connections.
    pub async fn shutdown_all(&self) {
        let mut inner = self.inner.write().await;
        let count = inner.connections.len();
        for sender in inner.connections.values() {
            let _ = sender.send(Message::Close(None));
        }
        inner.connections.clear();
        inner.rooms.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }
}
