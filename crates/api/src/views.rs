//! Identity-enriched response shapes.
//!
//! Stored records reference users by id; everything returned to clients
//! (request responses, acks, broadcasts) carries the resolved name/email
//! alongside. Missing users degrade to a placeholder identity rather than
//! failing the read.

use serde::Serialize;

use atelier_core::activity::ActivityEntry;
use atelier_core::chat::{ChatMessage, MessageKind};
use atelier_core::project::{CanvasData, Milestone, Project, ProjectStatus};
use atelier_core::types::{Id, Timestamp};
use atelier_core::user::UserIdentity;
use atelier_store::Store;

use crate::error::ApiResult;

/// A chat message with its sender resolved.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessageView {
    pub id: Id,
    pub project_id: Id,
    pub content: String,
    pub kind: MessageKind,
    pub created_at: Timestamp,
    pub sender: UserIdentity,
}

impl ChatMessageView {
    pub fn new(message: ChatMessage, sender: UserIdentity) -> Self {
        Self {
            id: message.id,
            project_id: message.project_id,
            content: message.content,
            kind: message.kind,
            created_at: message.created_at,
            sender,
        }
    }
}

/// A project with its participant references resolved.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    pub id: Id,
    pub title: String,
    pub description: String,
    pub client: UserIdentity,
    pub artist: Option<UserIdentity>,
    pub collaborators: Vec<UserIdentity>,
    pub pending_collaborator_emails: Vec<String>,
    pub milestones: Vec<Milestone>,
    pub status: ProjectStatus,
    pub canvas: CanvasData,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An activity entry with its actor resolved (absent for system entries).
#[derive(Debug, Clone, Serialize)]
pub struct ActivityView {
    pub id: Id,
    pub project_id: Id,
    pub actor: Option<UserIdentity>,
    pub kind: String,
    pub message: String,
    pub meta: serde_json::Value,
    pub created_at: Timestamp,
}

/// Resolve a user id, degrading to a placeholder if the record is gone.
async fn identity_of(store: &dyn Store, id: Id) -> ApiResult<UserIdentity> {
    match store.user_by_id(id).await? {
        Some(user) => Ok(user.identity()),
        None => {
            tracing::debug!(user_id = %id, "Referenced user no longer exists");
            Ok(UserIdentity {
                id,
                name: "Unknown".into(),
                email: String::new(),
            })
        }
    }
}

/// Build the enriched view of a project.
pub async fn project_view(store: &dyn Store, project: Project) -> ApiResult<ProjectView> {
    let client = identity_of(store, project.client).await?;

    let artist = match project.artist {
        Some(id) => Some(identity_of(store, id).await?),
        None => None,
    };

    let mut collaborators = Vec::with_capacity(project.collaborators.len());
    for id in &project.collaborators {
        collaborators.push(identity_of(store, *id).await?);
    }

    Ok(ProjectView {
        id: project.id,
        title: project.title,
        description: project.description,
        client,
        artist,
        collaborators,
        pending_collaborator_emails: project.pending_collaborator_emails,
        milestones: project.milestones,
        status: project.status,
        canvas: project.canvas,
        created_at: project.created_at,
        updated_at: project.updated_at,
    })
}

/// Build the enriched view of a chat message.
pub async fn message_view(store: &dyn Store, message: ChatMessage) -> ApiResult<ChatMessageView> {
    let sender = identity_of(store, message.sender).await?;
    Ok(ChatMessageView::new(message, sender))
}

/// Build the enriched view of an activity entry.
pub async fn activity_view(store: &dyn Store, entry: ActivityEntry) -> ApiResult<ActivityView> {
    let actor = match entry.actor {
        Some(id) => Some(identity_of(store, id).await?),
        None => None,
    };
    Ok(ActivityView {
        id: entry.id,
        project_id: entry.project_id,
        actor,
        kind: entry.kind,
        message: entry.message,
        meta: entry.meta,
        created_at: entry.created_at,
    })
}
