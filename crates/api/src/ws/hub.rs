//! The collaboration hub: dispatch for inbound realtime events.
//!
//! Per (session, project) pair the state machine is
//! `not-joined -> joined -> not-joined`. Acked events received while
//! not-joined answer with a negative ack; fire-and-forget events are
//! silently ignored in that state. Join itself runs the access gate, so
//! advisory broadcasts need no further authorization check.

use std::sync::Arc;

use serde_json::json;

use atelier_core::access::{can_access, Access};
use atelier_core::types::Id;

use atelier_store::Store;

use crate::mutator::ProjectMutator;
use crate::ws::protocol::{Ack, ActorRef, ClientEvent, ServerEvent};
use crate::ws::rooms::RoomRegistry;
use crate::ws::session::RealtimeSession;

/// Orchestrates incoming realtime events: gate checks via the shared
/// access predicate, persistence via the shared mutator, fan-out via the
/// room registry.
pub struct CollaborationHub {
    store: Arc<dyn Store>,
    rooms: Arc<RoomRegistry>,
    mutator: Arc<ProjectMutator>,
}

impl CollaborationHub {
    pub fn new(
        store: Arc<dyn Store>,
        rooms: Arc<RoomRegistry>,
        mutator: Arc<ProjectMutator>,
    ) -> Self {
        Self {
            store,
            rooms,
            mutator,
        }
    }

    /// Dispatch one client event. Returns `Some(ack)` for acked event
    /// types, `None` for fire-and-forget ones.
    pub async fn handle(&self, session: &mut RealtimeSession, event: ClientEvent) -> Option<Ack> {
        match event {
            ClientEvent::JoinProject { project_id } => {
                Some(self.join(session, project_id).await)
            }
            ClientEvent::LeaveProject { project_id } => {
                self.leave(session, project_id).await;
                None
            }
            ClientEvent::ChatSend {
                project_id,
                content,
            } => Some(self.chat_send(session, project_id, &content).await),
            ClientEvent::AnnotationCreated {
                project_id,
                annotation,
            } => Some(self.annotation_created(session, project_id, annotation).await),
            ClientEvent::MilestoneUpdated {
                project_id,
                milestone_index,
                status,
            } => {
                let event = ServerEvent::MilestoneStatusUpdated {
                    project_id,
                    milestone_index,
                    status,
                    updated_by: ActorRef::from(&session.user),
                    timestamp: chrono::Utc::now(),
                };
                self.advisory(session, project_id, event).await;
                None
            }
            ClientEvent::FileUploaded {
                project_id,
                milestone_index,
                filename,
            } => {
                let event = ServerEvent::NewFileNotification {
                    project_id,
                    milestone_index,
                    filename,
                    uploaded_by: ActorRef::from(&session.user),
                    timestamp: chrono::Utc::now(),
                };
                self.advisory(session, project_id, event).await;
                None
            }
            ClientEvent::CanvasUpdate {
                project_id,
                image_data,
            } => {
                let event = ServerEvent::CanvasUpdate {
                    project_id,
                    image_data,
                    updated_by: ActorRef::from(&session.user),
                    timestamp: chrono::Utc::now(),
                };
                self.advisory(session, project_id, event).await;
                None
            }
        }
    }

    /// Join a project room: gate check against the current project state,
    /// then idempotent registration.
    async fn join(&self, session: &mut RealtimeSession, project_id: Id) -> Ack {
        let project = match self.store.project_by_id(project_id).await {
            Ok(Some(project)) => project,
            Ok(None) => return Ack::err("Project not found"),
            Err(err) => {
                tracing::warn!(project_id = %project_id, error = %err, "Join failed");
                return Ack::err("Join failed");
            }
        };

        if let Access::Denied(reason) = can_access(session.user.id, &project) {
            return Ack::err(reason);
        }

        self.rooms.join(project_id, &session.conn_id).await;
        session.mark_joined(project_id);
        tracing::debug!(
            conn_id = %session.conn_id,
            project_id = %project_id,
            "Joined project room"
        );
        Ack::ok()
    }

    /// Leave a project room. Idempotent; no ack.
    async fn leave(&self, session: &mut RealtimeSession, project_id: Id) {
        self.rooms.leave(project_id, &session.conn_id).await;
        session.mark_left(project_id);
    }

    /// Persist and fan out a chat message. The sender's authoritative copy
    /// is the ack payload; the broadcast excludes their connection.
    async fn chat_send(&self, session: &RealtimeSession, project_id: Id, content: &str) -> Ack {
        if !session.is_joined(project_id) {
            return Ack::err("Not joined to this project");
        }

        match self
            .mutator
            .send_chat(&session.user, project_id, content, Some(&session.conn_id))
            .await
        {
            Ok(view) => Ack::ok_with(json!({ "message": view })),
            Err(err) => Ack::err(err.message()),
        }
    }

    /// Broadcast an annotation announcement. This path never persists:
    /// the drawing surface saves through the request path and announces
    /// here, as two independent client calls.
    async fn annotation_created(
        &self,
        session: &RealtimeSession,
        project_id: Id,
        annotation: serde_json::Value,
    ) -> Ack {
        if !session.is_joined(project_id) {
            return Ack::err("Not joined to this project");
        }
        if annotation.is_null() {
            return Ack::err("Invalid annotation");
        }

        let project = match self.store.project_by_id(project_id).await {
            Ok(Some(project)) => project,
            Ok(None) => return Ack::err("Project not found"),
            Err(err) => {
                tracing::warn!(project_id = %project_id, error = %err, "Broadcast failed");
                return Ack::err("Broadcast failed");
            }
        };
        if let Access::Denied(reason) = can_access(session.user.id, &project) {
            return Ack::err(reason);
        }

        self.rooms
            .broadcast(
                project_id,
                &ServerEvent::AnnotationNew {
                    project_id,
                    annotation,
                },
                Some(&session.conn_id),
            )
            .await;
        Ack::ok()
    }

    /// Fan out an advisory signal. Silently ignored while not joined
    /// (these events carry no ack).
    async fn advisory(&self, session: &RealtimeSession, project_id: Id, event: ServerEvent) {
        if !session.is_joined(project_id) {
            tracing::trace!(
                conn_id = %session.conn_id,
                project_id = %project_id,
                "Advisory event from non-joined session ignored"
            );
            return;
        }
        self.rooms
            .broadcast(project_id, &event, Some(&session.conn_id))
            .await;
    }
}
