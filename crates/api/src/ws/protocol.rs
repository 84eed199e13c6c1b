//! Wire protocol for the realtime channel.
//!
//! Frames are JSON text messages. Client frames carry an `event` tag, a
//! `data` payload, and an optional `ack` id; events the server acknowledges
//! answer with an `ack` frame echoing that id. Server-initiated frames use
//! the same `event`/`data` envelope without an ack id.

use axum::extract::ws::Message;
use serde::{Deserialize, Serialize};

use atelier_core::types::{Id, Timestamp};
use atelier_core::user::UserIdentity;

use crate::views::ChatMessageView;

// ---------------------------------------------------------------------------
// Client -> server
// ---------------------------------------------------------------------------

/// A parsed inbound frame: the event plus the optional ack id the client
/// wants echoed back.
#[derive(Debug, Deserialize)]
pub struct ClientFrame {
    #[serde(default)]
    pub ack: Option<u64>,
    #[serde(flatten)]
    pub event: ClientEvent,
}

/// Events a client may send over an established connection.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "join-project")]
    JoinProject { project_id: Id },

    #[serde(rename = "leave-project")]
    LeaveProject { project_id: Id },

    #[serde(rename = "chat:send")]
    ChatSend { project_id: Id, content: String },

    /// Announce an annotation to the room. Persistence happens through the
    /// request surface; this event only broadcasts.
    #[serde(rename = "annotation:created")]
    AnnotationCreated {
        project_id: Id,
        #[serde(default)]
        annotation: serde_json::Value,
    },

    #[serde(rename = "milestone-updated")]
    MilestoneUpdated {
        project_id: Id,
        milestone_index: usize,
        status: String,
    },

    #[serde(rename = "file-uploaded")]
    FileUploaded {
        project_id: Id,
        milestone_index: usize,
        filename: String,
    },

    #[serde(rename = "canvas-update")]
    CanvasUpdate { project_id: Id, image_data: String },
}

// ---------------------------------------------------------------------------
// Server -> clients
// ---------------------------------------------------------------------------

/// Minimal actor reference attached to advisory broadcasts.
#[derive(Debug, Clone, Serialize)]
pub struct ActorRef {
    pub id: Id,
    pub name: String,
}

impl From<&UserIdentity> for ActorRef {
    fn from(user: &UserIdentity) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
        }
    }
}

/// Events the server fans out to room members.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "chat:new")]
    ChatNew(ChatMessageView),

    #[serde(rename = "annotation:new")]
    AnnotationNew {
        project_id: Id,
        annotation: serde_json::Value,
    },

    #[serde(rename = "milestone-status-updated")]
    MilestoneStatusUpdated {
        project_id: Id,
        milestone_index: usize,
        status: String,
        updated_by: ActorRef,
        timestamp: Timestamp,
    },

    #[serde(rename = "new-file-notification")]
    NewFileNotification {
        project_id: Id,
        milestone_index: usize,
        filename: String,
        uploaded_by: ActorRef,
        timestamp: Timestamp,
    },

    #[serde(rename = "canvas-update")]
    CanvasUpdate {
        project_id: Id,
        image_data: String,
        updated_by: ActorRef,
        timestamp: Timestamp,
    },

    #[serde(rename = "project-status-updated")]
    ProjectStatusUpdated {
        project_id: Id,
        status: String,
        updated_by: ActorRef,
        timestamp: Timestamp,
    },
}

impl ServerEvent {
    /// Serialize into a WebSocket text frame.
    pub fn to_message(&self) -> Message {
        // ServerEvent serialization cannot fail: every payload is
        // Serialize-derived over plain data.
        let text = serde_json::to_string(self).expect("server event serializes");
        Message::Text(text.into())
    }
}

// ---------------------------------------------------------------------------
// Acks
// ---------------------------------------------------------------------------

/// Acknowledgment body for acked client events.
#[derive(Debug, Clone, Serialize)]
pub struct Ack {
    pub ok: bool,
    /// Human-readable failure reason; absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Extra payload merged into the ack body (e.g. the persisted chat
    /// message for `chat:send`).
    #[serde(flatten)]
    pub data: Option<serde_json::Value>,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            ok: true,
            message: None,
            data: None,
        }
    }

    pub fn ok_with(data: serde_json::Value) -> Self {
        Self {
            ok: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Build the ack frame echoing the client-supplied ack id.
pub fn ack_frame(ack_id: u64, ack: &Ack) -> Message {
    let text = serde_json::to_string(&serde_json::json!({
        "event": "ack",
        "ack": ack_id,
        "data": ack,
    }))
    .expect("ack frame serializes");
    Message::Text(text.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_frame_parses_event_and_ack_id() {
        let raw = r#"{"event":"chat:send","ack":7,"data":{"project_id":"7f1d6ac0-91f5-4a8f-a9c8-9dbd2a9ab1de","content":"hello"}}"#;
        let frame: ClientFrame = serde_json::from_str(raw).unwrap();

        assert_eq!(frame.ack, Some(7));
        match frame.event {
            ClientEvent::ChatSend { content, .. } => assert_eq!(content, "hello"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn ack_id_is_optional() {
        let raw = r#"{"event":"leave-project","data":{"project_id":"7f1d6ac0-91f5-4a8f-a9c8-9dbd2a9ab1de"}}"#;
        let frame: ClientFrame = serde_json::from_str(raw).unwrap();

        assert_eq!(frame.ack, None);
        assert!(matches!(frame.event, ClientEvent::LeaveProject { .. }));
    }

    #[test]
    fn unknown_events_fail_to_parse() {
        let raw = r#"{"event":"rm-rf","data":{}}"#;
        assert!(serde_json::from_str::<ClientFrame>(raw).is_err());
    }

    #[test]
    fn failure_ack_carries_the_reason() {
        let frame = ack_frame(3, &Ack::err("Not authorized"));
        let Message::Text(text) = frame else {
            panic!("expected a text frame");
        };
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["event"], "ack");
        assert_eq!(value["ack"], 3);
        assert_eq!(value["data"]["ok"], false);
        assert_eq!(value["data"]["message"], "Not authorized");
    }
}
