//! PostgreSQL implementation of the [`Store`] capability.
//!
//! Projects keep their embedded documents (collaborators, pending emails,
//! milestones, canvas) as JSONB columns. Set-adds are single guarded
//! `UPDATE` statements (`WHERE NOT col @> elem`), so two concurrent invites
//! cannot drop one another. Milestone and canvas appends decode, grow, and
//! write back under a `SELECT ... FOR UPDATE` row lock in one transaction.

use sqlx::postgres::PgPoolOptions;
use sqlx::FromRow;

use atelier_core::activity::ActivityEntry;
use atelier_core::chat::{ChatMessage, MessageKind};
use atelier_core::project::{
    ensure_milestone, Annotation, CanvasData, CanvasVersion, Milestone, Project, ProjectStatus,
};
use atelier_core::types::{Id, Timestamp};
use atelier_core::user::User;

use crate::{Store, StoreError};
use async_trait::async_trait;

/// Re-exported pool type so the server crate does not name sqlx directly.
pub type PgPool = sqlx::PgPool;

/// Create a connection pool for the given database URL.
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Cheap connectivity probe, run once at startup.
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

/// Apply embedded migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at";

const PROJECT_COLUMNS: &str = "\
    id, title, description, client, artist, collaborators, \
    pending_collaborator_emails, milestones, status, canvas, \
    created_at, updated_at";

const MESSAGE_COLUMNS: &str = "id, project_id, sender, content, kind, created_at";

const ACTIVITY_COLUMNS: &str = "id, project_id, actor, kind, message, meta, created_at";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(FromRow)]
struct UserRow {
    id: Id,
    name: String,
    email: String,
    password_hash: String,
    created_at: Timestamp,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct ProjectRow {
    id: Id,
    title: String,
    description: String,
    client: Id,
    artist: Option<Id>,
    collaborators: serde_json::Value,
    pending_collaborator_emails: serde_json::Value,
    milestones: serde_json::Value,
    status: String,
    canvas: serde_json::Value,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl TryFrom<ProjectRow> for Project {
    type Error = StoreError;

    fn try_from(row: ProjectRow) -> Result<Self, StoreError> {
        let status = ProjectStatus::parse(&row.status)
            .map_err(|_| StoreError::Backend(format!("unknown project status: {}", row.status)))?;
        Ok(Project {
            id: row.id,
            title: row.title,
            description: row.description,
            client: row.client,
            artist: row.artist,
            collaborators: serde_json::from_value(row.collaborators)?,
            pending_collaborator_emails: serde_json::from_value(row.pending_collaborator_emails)?,
            milestones: serde_json::from_value(row.milestones)?,
            status,
            canvas: serde_json::from_value(row.canvas)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct MessageRow {
    id: Id,
    project_id: Id,
    sender: Id,
    content: String,
    kind: String,
    created_at: Timestamp,
}

impl TryFrom<MessageRow> for ChatMessage {
    type Error = StoreError;

    fn try_from(row: MessageRow) -> Result<Self, StoreError> {
        let kind = MessageKind::parse(&row.kind)
            .map_err(|_| StoreError::Backend(format!("unknown message kind: {}", row.kind)))?;
        Ok(ChatMessage {
            id: row.id,
            project_id: row.project_id,
            sender: row.sender,
            content: row.content,
            kind,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct ActivityRow {
    id: Id,
    project_id: Id,
    actor: Option<Id>,
    kind: String,
    message: String,
    meta: serde_json::Value,
    created_at: Timestamp,
}

impl From<ActivityRow> for ActivityEntry {
    fn from(row: ActivityRow) -> Self {
        ActivityEntry {
            id: row.id,
            project_id: row.project_id,
            actor: row.actor,
            kind: row.kind,
            message: row.message,
            meta: row.meta,
            created_at: row.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// PgStore
// ---------------------------------------------------------------------------

/// Production [`Store`] backed by PostgreSQL.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let query = format!("INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5)");
        sqlx::query(&query)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn user_by_id(&self, id: Id) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn insert_project(&self, project: &Project) -> Result<(), StoreError> {
        let query = format!(
            "INSERT INTO projects ({PROJECT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        );
        sqlx::query(&query)
            .bind(project.id)
            .bind(&project.title)
            .bind(&project.description)
            .bind(project.client)
            .bind(project.artist)
            .bind(serde_json::to_value(&project.collaborators)?)
            .bind(serde_json::to_value(&project.pending_collaborator_emails)?)
            .bind(serde_json::to_value(&project.milestones)?)
            .bind(project.status.as_str())
            .bind(serde_json::to_value(&project.canvas)?)
            .bind(project.created_at)
            .bind(project.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn project_by_id(&self, id: Id) -> Result<Option<Project>, StoreError> {
        let query = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");
        let row = sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Project::try_from).transpose()
    }

    async fn projects_for_user(&self, user: Id) -> Result<Vec<Project>, StoreError> {
        let query = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects \
             WHERE client = $1 OR artist = $1 OR collaborators @> to_jsonb($1::uuid) \
             ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, ProjectRow>(&query)
            .bind(user)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Project::try_from).collect()
    }

    async fn set_project_status(
        &self,
        project: Id,
        status: ProjectStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE projects SET status = $2, updated_at = now() WHERE id = $1")
            .bind(project)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "Project" });
        }
        Ok(())
    }

    async fn add_collaborator(&self, project: Id, user: Id) -> Result<bool, StoreError> {
        // Guarded append: the containment check and the append happen in one
        // statement, so concurrent adds of the same user collapse to one.
        let result = sqlx::query(
            "UPDATE projects \
                SET collaborators = collaborators || to_jsonb($2::uuid), \
                    updated_at = now() \
              WHERE id = $1 \
                AND NOT collaborators @> to_jsonb($2::uuid)",
        )
        .bind(project)
        .bind(user)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_pending_email(&self, project: Id, email: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE projects \
                SET pending_collaborator_emails = pending_collaborator_emails || to_jsonb($2::text), \
                    updated_at = now() \
              WHERE id = $1 \
                AND NOT pending_collaborator_emails @> to_jsonb($2::text)",
        )
        .bind(project)
        .bind(email)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn append_annotation(
        &self,
        project: Id,
        milestone_index: usize,
        annotation: Annotation,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT milestones FROM projects WHERE id = $1 FOR UPDATE")
                .bind(project)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((value,)) = row else {
            return Err(StoreError::NotFound { entity: "Project" });
        };

        let mut milestones: Vec<Milestone> = serde_json::from_value(value)?;
        ensure_milestone(&mut milestones, milestone_index)
            .annotations
            .push(annotation);

        sqlx::query("UPDATE projects SET milestones = $2, updated_at = now() WHERE id = $1")
            .bind(project)
            .bind(serde_json::to_value(&milestones)?)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn append_canvas_version(
        &self,
        project: Id,
        version: CanvasVersion,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT canvas FROM projects WHERE id = $1 FOR UPDATE")
                .bind(project)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((value,)) = row else {
            return Err(StoreError::NotFound { entity: "Project" });
        };

        let mut canvas: CanvasData = serde_json::from_value(value)?;
        canvas.current_version = Some(version.image_data.clone());
        canvas.versions.push(version);

        sqlx::query("UPDATE projects SET canvas = $2, updated_at = now() WHERE id = $1")
            .bind(project)
            .bind(serde_json::to_value(&canvas)?)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn attach_pending_invites(&self, email: &str, user: Id) -> Result<u64, StoreError> {
        // One statement across every project holding the invite: the
        // Postgres equivalent of a bulk $pull + $addToSet.
        let result = sqlx::query(
            "UPDATE projects \
                SET pending_collaborator_emails = pending_collaborator_emails - $1::text, \
                    collaborators = CASE \
                        WHEN collaborators @> to_jsonb($2::uuid) THEN collaborators \
                        ELSE collaborators || to_jsonb($2::uuid) \
                    END, \
                    updated_at = now() \
              WHERE pending_collaborator_emails @> to_jsonb($1::text)",
        )
        .bind(email)
        .bind(user)
        .execute(&self.pool)
        .await?;

        let attached = result.rows_affected();
        if attached > 0 {
            tracing::debug!(email, attached, "Resolved pending invitations");
        }
        Ok(attached)
    }

    async fn insert_message(&self, message: &ChatMessage) -> Result<(), StoreError> {
        let query =
            format!("INSERT INTO chat_messages ({MESSAGE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)");
        sqlx::query(&query)
            .bind(message.id)
            .bind(message.project_id)
            .bind(message.sender)
            .bind(&message.content)
            .bind(message.kind.as_str())
            .bind(message.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn messages_for_project(&self, project: Id) -> Result<Vec<ChatMessage>, StoreError> {
        let query = format!(
            "SELECT {MESSAGE_COLUMNS} FROM chat_messages \
             WHERE project_id = $1 ORDER BY created_at ASC"
        );
        let rows = sqlx::query_as::<_, MessageRow>(&query)
            .bind(project)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(ChatMessage::try_from).collect()
    }

    async fn insert_activity(&self, entry: &ActivityEntry) -> Result<(), StoreError> {
        let query =
            format!("INSERT INTO activities ({ACTIVITY_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)");
        sqlx::query(&query)
            .bind(entry.id)
            .bind(entry.project_id)
            .bind(entry.actor)
            .bind(&entry.kind)
            .bind(&entry.message)
            .bind(&entry.meta)
            .bind(entry.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn activity_for_project(
        &self,
        project: Id,
        limit: usize,
    ) -> Result<Vec<ActivityEntry>, StoreError> {
        let query = format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities \
             WHERE project_id = $1 ORDER BY created_at DESC LIMIT $2"
        );
        let rows = sqlx::query_as::<_, ActivityRow>(&query)
            .bind(project)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(ActivityEntry::from).collect())
    }
}
