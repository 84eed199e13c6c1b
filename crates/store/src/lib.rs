//! The `Store` capability: every persistence operation the collaboration
//! core needs, behind one object-safe trait.
//!
//! Two implementations ship: [`memory::InMemoryStore`] (tests and local
//! development) and [`postgres::PgStore`] (production). The trait surface is
//! deliberately operation-shaped rather than document-shaped: set-adds and
//! appends are their own methods so each backend can make them atomic
//! (guarded UPDATE statements in PostgreSQL, a single lock scope in memory)
//! instead of racing read-modify-write cycles over whole documents.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use atelier_core::activity::ActivityEntry;
use atelier_core::chat::ChatMessage;
use atelier_core::project::{Annotation, CanvasVersion, Project, ProjectStatus};
use atelier_core::types::Id;
use atelier_core::user::User;

/// Persistence-layer failures. `NotFound` is the target-record-absent case
/// for operations addressing a specific record; everything else is a
/// backend fault and surfaces as the triggering operation's failure (no
/// retry policy at this layer).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Backend(format!("document decode failed: {err}"))
    }
}

/// The storage capability consumed by the server.
///
/// All project sub-document mutations (collaborators, pending emails,
/// milestones, canvas) go through dedicated operations here; callers never
/// write a whole project document back after reading it.
#[async_trait]
pub trait Store: Send + Sync {
    // --- Users ---

    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    async fn user_by_id(&self, id: Id) -> Result<Option<User>, StoreError>;

    /// Lookup by normalized email.
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    // --- Projects ---

    async fn insert_project(&self, project: &Project) -> Result<(), StoreError>;

    async fn project_by_id(&self, id: Id) -> Result<Option<Project>, StoreError>;

    /// Projects where the user is client, artist, or collaborator,
    /// newest first.
    async fn projects_for_user(&self, user: Id) -> Result<Vec<Project>, StoreError>;

    /// Overwrite the project status. Idempotent; last writer wins.
    async fn set_project_status(&self, project: Id, status: ProjectStatus)
        -> Result<(), StoreError>;

    /// Atomic set-add of a collaborator. Returns `true` if the user was
    /// added, `false` if already present.
    async fn add_collaborator(&self, project: Id, user: Id) -> Result<bool, StoreError>;

    /// Atomic set-add of a pending-invitation email (already normalized).
    /// Returns `true` if the email was added, `false` if already present.
    async fn add_pending_email(&self, project: Id, email: &str) -> Result<bool, StoreError>;

    /// Append an annotation at the given milestone index, synthesizing
    /// intervening milestone slots. Atomic with respect to concurrent
    /// appends on the same project.
    async fn append_annotation(
        &self,
        project: Id,
        milestone_index: usize,
        annotation: Annotation,
    ) -> Result<(), StoreError>;

    /// Append a canvas version and make its image the current one.
    /// Atomic with respect to concurrent appends on the same project.
    async fn append_canvas_version(
        &self,
        project: Id,
        version: CanvasVersion,
    ) -> Result<(), StoreError>;

    /// Resolve pending invitations for a freshly linked identity: remove
    /// `email` from every project's pending set and set-add `user` into
    /// those projects' collaborators. Returns the number of projects
    /// touched.
    async fn attach_pending_invites(&self, email: &str, user: Id) -> Result<u64, StoreError>;

    // --- Chat ---

    async fn insert_message(&self, message: &ChatMessage) -> Result<(), StoreError>;

    /// Messages for a project in creation-time order (ascending).
    async fn messages_for_project(&self, project: Id) -> Result<Vec<ChatMessage>, StoreError>;

    // --- Activity ---

    async fn insert_activity(&self, entry: &ActivityEntry) -> Result<(), StoreError>;

    /// Most-recent-first activity entries, capped at `limit`.
    async fn activity_for_project(
        &self,
        project: Id,
        limit: usize,
    ) -> Result<Vec<ActivityEntry>, StoreError>;
}
