//! Per-connection session state.

use std::collections::HashSet;

use axum::extract::ws::Message;

use atelier_core::types::Id;
use atelier_core::user::UserIdentity;

use crate::ws::rooms::{ConnId, WsSender};

/// Ephemeral state for one authenticated WebSocket connection.
///
/// The identity is resolved once at handshake and frozen; every later
/// authorization decision uses it without re-resolving. Destroyed on
/// disconnect -- never persisted.
pub struct RealtimeSession {
    pub conn_id: ConnId,
    pub user: UserIdentity,
    joined: HashSet<Id>,
    sender: WsSender,
}

impl RealtimeSession {
    pub fn new(conn_id: ConnId, user: UserIdentity, sender: WsSender) -> Self {
        Self {
            conn_id,
            user,
            joined: HashSet::new(),
            sender,
        }
    }

    /// Whether this session has joined the given project room.
    pub fn is_joined(&self, project: Id) -> bool {
        self.joined.contains(&project)
    }

    pub(crate) fn mark_joined(&mut self, project: Id) {
        self.joined.insert(project);
    }

    pub(crate) fn mark_left(&mut self, project: Id) {
        self.joined.remove(&project);
    }

    /// Push a frame to this connection. Returns `false` if the connection
    /// is already gone (the frame is dropped; best effort).
    pub fn send(&self, message: Message) -> bool {
        self.sender.send(message).is_ok()
    }
}
