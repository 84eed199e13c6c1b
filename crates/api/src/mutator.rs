//! The authorized project mutation path.
//!
//! Every request-style mutation goes through [`ProjectMutator`]: load the
//! project (404 if absent), apply the access gate at the level the
//! operation requires, mutate through an atomic store operation, record
//! activity best-effort, and fan a room event out to subscribed sessions.
//! The WebSocket hub delegates chat persistence here too, so both entry
//! styles run the identical gate/audit/persist sequence.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use atelier_core::access::{can_access, can_manage, Access};
use atelier_core::activity::{kind, snippet, FEED_LIMIT};
use atelier_core::chat::{validate_content, ChatMessage};
use atelier_core::error::CoreError;
use atelier_core::project::{Annotation, AnnotationTool, CanvasVersion, Project, ProjectStatus};
use atelier_core::types::Id;
use atelier_core::user::{is_valid_email, normalize_email, UserIdentity};
use atelier_store::Store;

use crate::activity::ActivityRecorder;
use crate::error::{ApiError, ApiResult};
use crate::views::{self, ActivityView, ChatMessageView, ProjectView};
use crate::ws::protocol::{ActorRef, ServerEvent};
use crate::ws::rooms::RoomRegistry;

// ---------------------------------------------------------------------------
// Input DTOs
// ---------------------------------------------------------------------------

/// Payload for appending an annotation to a milestone.
#[derive(Debug, Deserialize)]
pub struct NewAnnotation {
    pub tool: AnnotationTool,
    pub color: String,
    #[serde(default)]
    pub image_data: Option<String>,
    pub comment: String,
}

// ---------------------------------------------------------------------------
// ProjectMutator
// ---------------------------------------------------------------------------

/// Applies authorized mutations to project state.
pub struct ProjectMutator {
    store: Arc<dyn Store>,
    rooms: Arc<RoomRegistry>,
    recorder: ActivityRecorder,
}

/// Convert a gate decision into an operation result.
fn gate(access: Access) -> ApiResult<()> {
    match access {
        Access::Granted => Ok(()),
        Access::Denied(reason) => Err(ApiError::Core(CoreError::Forbidden(reason.into()))),
    }
}

impl ProjectMutator {
    pub fn new(store: Arc<dyn Store>, rooms: Arc<RoomRegistry>, recorder: ActivityRecorder) -> Self {
        Self {
            store,
            rooms,
            recorder,
        }
    }

    async fn load_project(&self, id: Id) -> ApiResult<Project> {
        self.store
            .project_by_id(id)
            .await?
            .ok_or(ApiError::Core(CoreError::NotFound {
                entity: "Project",
                id,
            }))
    }

    /// Create a project; the acting identity becomes the client.
    pub async fn create_project(
        &self,
        actor: &UserIdentity,
        title: &str,
        description: &str,
    ) -> ApiResult<ProjectView> {
        let title = title.trim();
        let description = description.trim();
        if title.is_empty() || description.is_empty() {
            return Err(ApiError::Core(CoreError::InvalidInput(
                "Title and description are required".into(),
            )));
        }

        let project = Project::new(title.to_string(), description.to_string(), actor.id);
        self.store.insert_project(&project).await?;

        tracing::info!(project_id = %project.id, client = %actor.id, "Project created");

        views::project_view(self.store.as_ref(), project).await
    }

    /// Read one project (participant gate).
    pub async fn project(&self, actor: &UserIdentity, id: Id) -> ApiResult<ProjectView> {
        let project = self.load_project(id).await?;
        gate(can_access(actor.id, &project))?;
        views::project_view(self.store.as_ref(), project).await
    }

    /// Projects the actor participates in, newest first.
    pub async fn projects_for(&self, actor: &UserIdentity) -> ApiResult<Vec<ProjectView>> {
        let projects = self.store.projects_for_user(actor.id).await?;
        let mut out = Vec::with_capacity(projects.len());
        for project in projects {
            out.push(views::project_view(self.store.as_ref(), project).await?);
        }
        Ok(out)
    }

    /// Add a collaborator by email (owner gate).
    ///
    /// A known email is set-added to the collaborator set; an unknown one is
    /// set-added to the pending-invitation set. Duplicates of either kind
    /// are no-op successes, and a user already holding a role on the
    /// project is never added a second time under another role.
    pub async fn add_collaborator(
        &self,
        actor: &UserIdentity,
        project_id: Id,
        email: &str,
    ) -> ApiResult<ProjectView> {
        if email.trim().is_empty() {
            return Err(ApiError::Core(CoreError::InvalidInput(
                "Email required".into(),
            )));
        }
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(ApiError::Core(CoreError::InvalidInput(
                "Please enter a valid email".into(),
            )));
        }

        let project = self.load_project(project_id).await?;
        gate(can_manage(actor.id, &project))?;

        match self.store.user_by_email(&email).await? {
            Some(user) => {
                if project.role_of(user.id).is_some() {
                    tracing::debug!(
                        project_id = %project_id,
                        user_id = %user.id,
                        "Invitee already participates; nothing to add"
                    );
                } else if self.store.add_collaborator(project_id, user.id).await? {
                    self.recorder
                        .record(
                            project_id,
                            Some(actor.id),
                            kind::COLLABORATOR_ADDED,
                            format!("{} added {} as a collaborator", actor.name, user.name),
                            json!({
                                "collaborator_id": user.id,
                                "collaborator_email": user.email,
                            }),
                        )
                        .await;
                }
            }
            None => {
                if self.store.add_pending_email(project_id, &email).await? {
                    self.recorder
                        .record(
                            project_id,
                            Some(actor.id),
                            kind::COLLABORATOR_INVITED,
                            format!("{} invited {} to collaborate", actor.name, email),
                            json!({ "collaborator_email": email }),
                        )
                        .await;
                }
            }
        }

        let refreshed = self.load_project(project_id).await?;
        views::project_view(self.store.as_ref(), refreshed).await
    }

    /// Set the project status (participant gate). Last writer wins.
    pub async fn update_status(
        &self,
        actor: &UserIdentity,
        project_id: Id,
        status: &str,
    ) -> ApiResult<ProjectView> {
        let status = ProjectStatus::parse(status)?;

        let project = self.load_project(project_id).await?;
        gate(can_access(actor.id, &project))?;

        self.store.set_project_status(project_id, status).await?;

        self.recorder
            .record(
                project_id,
                Some(actor.id),
                kind::STATUS_CHANGED,
                format!("{} changed status to {}", actor.name, status.as_str()),
                json!({ "status": status.as_str() }),
            )
            .await;

        self.rooms
            .broadcast(
                project_id,
                &ServerEvent::ProjectStatusUpdated {
                    project_id,
                    status: status.as_str().to_string(),
                    updated_by: ActorRef::from(actor),
                    timestamp: chrono::Utc::now(),
                },
                None,
            )
            .await;

        let refreshed = self.load_project(project_id).await?;
        views::project_view(self.store.as_ref(), refreshed).await
    }

    /// Append an annotation at a milestone index (participant gate),
    /// synthesizing intervening milestone slots.
    ///
    /// The realtime `annotation:new` announcement comes from the client's
    /// own socket event, not from this path.
    pub async fn append_annotation(
        &self,
        actor: &UserIdentity,
        project_id: Id,
        milestone_index: usize,
        input: NewAnnotation,
    ) -> ApiResult<Annotation> {
        let project = self.load_project(project_id).await?;
        gate(can_access(actor.id, &project))?;

        let comment = input.comment.trim();
        if comment.is_empty() {
            return Err(ApiError::Core(CoreError::InvalidInput(
                "Comment required".into(),
            )));
        }

        let annotation = Annotation {
            author: actor.id,
            tool: input.tool,
            color: input.color,
            image_data: input.image_data,
            comment: comment.to_string(),
            timestamp: chrono::Utc::now(),
            milestone_index,
        };

        self.store
            .append_annotation(project_id, milestone_index, annotation.clone())
            .await?;

        self.recorder
            .record(
                project_id,
                Some(actor.id),
                kind::ANNOTATION_ADDED,
                format!("{} added an annotation", actor.name),
                json!({
                    "milestone_index": milestone_index,
                    "tool": annotation.tool,
                    "color": annotation.color,
                    "comment": annotation.comment,
                }),
            )
            .await;

        Ok(annotation)
    }

    /// Append a canvas version and make it current (participant gate).
    pub async fn append_canvas_version(
        &self,
        actor: &UserIdentity,
        project_id: Id,
        image_data: String,
        description: Option<String>,
    ) -> ApiResult<CanvasVersion> {
        let project = self.load_project(project_id).await?;
        gate(can_access(actor.id, &project))?;

        if image_data.trim().is_empty() {
            return Err(ApiError::Core(CoreError::InvalidInput(
                "Image data required".into(),
            )));
        }

        let description = description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("Version {}", project.canvas.versions.len() + 1));

        let version = CanvasVersion {
            image_data: image_data.clone(),
            created_by: actor.id,
            created_at: chrono::Utc::now(),
            description: description.clone(),
        };

        self.store
            .append_canvas_version(project_id, version.clone())
            .await?;

        self.recorder
            .record(
                project_id,
                Some(actor.id),
                kind::CANVAS_SAVED,
                format!("{} saved a canvas version", actor.name),
                json!({ "description": description }),
            )
            .await;

        self.rooms
            .broadcast(
                project_id,
                &ServerEvent::CanvasUpdate {
                    project_id,
                    image_data,
                    updated_by: ActorRef::from(actor),
                    timestamp: chrono::Utc::now(),
                },
                None,
            )
            .await;

        Ok(version)
    }

    /// Read the activity feed (participant gate), newest first, capped.
    pub async fn activity_feed(
        &self,
        actor: &UserIdentity,
        project_id: Id,
    ) -> ApiResult<Vec<ActivityView>> {
        let project = self.load_project(project_id).await?;
        gate(can_access(actor.id, &project))?;

        let entries = self.store.activity_for_project(project_id, FEED_LIMIT).await?;
        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            out.push(views::activity_view(self.store.as_ref(), entry).await?);
        }
        Ok(out)
    }

    /// Persist a chat message and fan it out (participant gate).
    ///
    /// `exclude_conn` names the sender's own connection on the socket path:
    /// the sender's single authoritative copy is the ack/response, never a
    /// broadcast echo.
    pub async fn send_chat(
        &self,
        actor: &UserIdentity,
        project_id: Id,
        content: &str,
        exclude_conn: Option<&str>,
    ) -> ApiResult<ChatMessageView> {
        let content = validate_content(content)?;

        let project = self.load_project(project_id).await?;
        gate(can_access(actor.id, &project))?;

        let message = ChatMessage::text(project_id, actor.id, content);
        self.store.insert_message(&message).await?;

        self.recorder
            .record(
                project_id,
                Some(actor.id),
                kind::CHAT_MESSAGE,
                format!(
                    "{} sent a message: {}",
                    actor.name,
                    snippet(&message.content)
                ),
                json!({ "message_id": message.id }),
            )
            .await;

        let view = ChatMessageView::new(message, actor.clone());
        self.rooms
            .broadcast(project_id, &ServerEvent::ChatNew(view.clone()), exclude_conn)
            .await;

        Ok(view)
    }

    /// Read a project's chat history (participant gate), oldest first.
    pub async fn messages(
        &self,
        actor: &UserIdentity,
        project_id: Id,
    ) -> ApiResult<Vec<ChatMessageView>> {
        let project = self.load_project(project_id).await?;
        gate(can_access(actor.id, &project))?;

        let messages = self.store.messages_for_project(project_id).await?;
        let mut out = Vec::with_capacity(messages.len());
        for message in messages {
            out.push(views::message_view(self.store.as_ref(), message).await?);
        }
        Ok(out)
    }
}
