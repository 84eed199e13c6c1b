//! In-memory store used by tests and local development.
//!
//! A single `RwLock` over plain maps. Every trait operation completes its
//! read-check-mutate cycle inside one lock scope, which is what makes the
//! set-add and append operations atomic here.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use atelier_core::activity::ActivityEntry;
use atelier_core::chat::ChatMessage;
use atelier_core::project::{ensure_milestone, Annotation, CanvasVersion, Project, ProjectStatus};
use atelier_core::types::Id;
use atelier_core::user::User;

use crate::{Store, StoreError};

#[derive(Default)]
struct Inner {
    users: HashMap<Id, User>,
    projects: HashMap<Id, Project>,
    messages: Vec<ChatMessage>,
    activities: Vec<ActivityEntry>,
}

/// Process-local [`Store`] implementation.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn project_mut<'a>(inner: &'a mut Inner, id: Id) -> Result<&'a mut Project, StoreError> {
    inner
        .projects
        .get_mut(&id)
        .ok_or(StoreError::NotFound { entity: "Project" })
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn user_by_id(&self, id: Id) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert_project(&self, project: &Project) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.projects.insert(project.id, project.clone());
        Ok(())
    }

    async fn project_by_id(&self, id: Id) -> Result<Option<Project>, StoreError> {
        Ok(self.inner.read().await.projects.get(&id).cloned())
    }

    async fn projects_for_user(&self, user: Id) -> Result<Vec<Project>, StoreError> {
        let inner = self.inner.read().await;
        let mut projects: Vec<Project> = inner
            .projects
            .values()
            .filter(|p| p.role_of(user).is_some())
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    async fn set_project_status(
        &self,
        project: Id,
        status: ProjectStatus,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let project = project_mut(&mut inner, project)?;
        project.status = status;
        project.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn add_collaborator(&self, project: Id, user: Id) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let project = project_mut(&mut inner, project)?;
        if project.collaborators.contains(&user) {
            return Ok(false);
        }
        project.collaborators.push(user);
        project.updated_at = chrono::Utc::now();
        Ok(true)
    }

    async fn add_pending_email(&self, project: Id, email: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let project = project_mut(&mut inner, project)?;
        if project
            .pending_collaborator_emails
            .iter()
            .any(|e| e == email)
        {
            return Ok(false);
        }
        project.pending_collaborator_emails.push(email.to_string());
        project.updated_at = chrono::Utc::now();
        Ok(true)
    }

    async fn append_annotation(
        &self,
        project: Id,
        milestone_index: usize,
        annotation: Annotation,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let project = project_mut(&mut inner, project)?;
        ensure_milestone(&mut project.milestones, milestone_index)
            .annotations
            .push(annotation);
        project.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn append_canvas_version(
        &self,
        project: Id,
        version: CanvasVersion,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let project = project_mut(&mut inner, project)?;
        project.canvas.current_version = Some(version.image_data.clone());
        project.canvas.versions.push(version);
        project.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn attach_pending_invites(&self, email: &str, user: Id) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let mut touched = 0;
        for project in inner.projects.values_mut() {
            if !project.pending_collaborator_emails.iter().any(|e| e == email) {
                continue;
            }
            project.pending_collaborator_emails.retain(|e| e != email);
            if !project.collaborators.contains(&user) {
                project.collaborators.push(user);
            }
            project.updated_at = chrono::Utc::now();
            touched += 1;
        }
        Ok(touched)
    }

    async fn insert_message(&self, message: &ChatMessage) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.messages.push(message.clone());
        Ok(())
    }

    async fn messages_for_project(&self, project: Id) -> Result<Vec<ChatMessage>, StoreError> {
        let inner = self.inner.read().await;
        let mut messages: Vec<ChatMessage> = inner
            .messages
            .iter()
            .filter(|m| m.project_id == project)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }

    async fn insert_activity(&self, entry: &ActivityEntry) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.activities.push(entry.clone());
        Ok(())
    }

    async fn activity_for_project(
        &self,
        project: Id,
        limit: usize,
    ) -> Result<Vec<ActivityEntry>, StoreError> {
        let inner = self.inner.read().await;
        let mut entries: Vec<ActivityEntry> = inner
            .activities
            .iter()
            .filter(|e| e.project_id == project)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_project(client: Id) -> Project {
        Project::new("Character sheet".into(), "Full-body turnaround".into(), client)
    }

    fn sample_annotation(author: Id, milestone_index: usize) -> Annotation {
        Annotation {
            author,
            tool: atelier_core::project::AnnotationTool::Pen,
            color: "#ff0000".into(),
            image_data: Some("ZGF0YQ==".into()),
            comment: "Shorten the sleeve".into(),
            timestamp: chrono::Utc::now(),
            milestone_index,
        }
    }

    #[tokio::test]
    async fn add_collaborator_is_a_set_add() {
        let store = InMemoryStore::new();
        let client = uuid::Uuid::new_v4();
        let collaborator = uuid::Uuid::new_v4();
        let project = sample_project(client);
        store.insert_project(&project).await.unwrap();

        assert!(store.add_collaborator(project.id, collaborator).await.unwrap());
        assert!(!store.add_collaborator(project.id, collaborator).await.unwrap());

        let stored = store.project_by_id(project.id).await.unwrap().unwrap();
        assert_eq!(stored.collaborators, vec![collaborator]);
    }

    #[tokio::test]
    async fn add_pending_email_is_idempotent() {
        let store = InMemoryStore::new();
        let project = sample_project(uuid::Uuid::new_v4());
        store.insert_project(&project).await.unwrap();

        assert!(store
            .add_pending_email(project.id, "b@x.com")
            .await
            .unwrap());
        assert!(!store
            .add_pending_email(project.id, "b@x.com")
            .await
            .unwrap());

        let stored = store.project_by_id(project.id).await.unwrap().unwrap();
        assert_eq!(stored.pending_collaborator_emails, vec!["b@x.com"]);
    }

    #[tokio::test]
    async fn append_annotation_synthesizes_milestones() {
        let store = InMemoryStore::new();
        let client = uuid::Uuid::new_v4();
        let project = sample_project(client);
        store.insert_project(&project).await.unwrap();

        store
            .append_annotation(project.id, 3, sample_annotation(client, 3))
            .await
            .unwrap();

        let stored = store.project_by_id(project.id).await.unwrap().unwrap();
        assert_eq!(stored.milestones.len(), 4);
        assert_eq!(stored.milestones[0].title, "Milestone 1");
        assert_eq!(stored.milestones[2].title, "Milestone 3");
        assert_eq!(stored.milestones[3].annotations.len(), 1);
        assert!(stored.milestones[..3]
            .iter()
            .all(|m| m.annotations.is_empty()));
    }

    #[tokio::test]
    async fn attach_pending_invites_moves_email_to_collaborators() {
        let store = InMemoryStore::new();
        let client = uuid::Uuid::new_v4();
        let newcomer = uuid::Uuid::new_v4();
        let project = sample_project(client);
        store.insert_project(&project).await.unwrap();
        store
            .add_pending_email(project.id, "b@x.com")
            .await
            .unwrap();

        let touched = store.attach_pending_invites("b@x.com", newcomer).await.unwrap();
        assert_eq!(touched, 1);

        let stored = store.project_by_id(project.id).await.unwrap().unwrap();
        assert!(stored.pending_collaborator_emails.is_empty());
        assert_eq!(stored.collaborators, vec![newcomer]);

        // A second resolution for the same email touches nothing.
        let touched = store.attach_pending_invites("b@x.com", newcomer).await.unwrap();
        assert_eq!(touched, 0);
    }

    #[tokio::test]
    async fn canvas_append_updates_current_version() {
        let store = InMemoryStore::new();
        let client = uuid::Uuid::new_v4();
        let project = sample_project(client);
        store.insert_project(&project).await.unwrap();

        let version = CanvasVersion {
            image_data: "aW1n".into(),
            created_by: client,
            created_at: chrono::Utc::now(),
            description: "Version 1".into(),
        };
        store
            .append_canvas_version(project.id, version)
            .await
            .unwrap();

        let stored = store.project_by_id(project.id).await.unwrap().unwrap();
        assert_eq!(stored.canvas.versions.len(), 1);
        assert_eq!(stored.canvas.current_version.as_deref(), Some("aW1n"));
    }

    #[tokio::test]
    async fn activity_feed_is_newest_first_and_capped() {
        let store = InMemoryStore::new();
        let project = uuid::Uuid::new_v4();

        for i in 0..5 {
            let mut entry = ActivityEntry::new(
                project,
                None,
                atelier_core::activity::kind::CHAT_MESSAGE,
                format!("message {i}"),
                serde_json::json!({}),
            );
            entry.created_at =
                chrono::Utc::now() + chrono::Duration::milliseconds(i);
            store.insert_activity(&entry).await.unwrap();
        }

        let feed = store.activity_for_project(project, 3).await.unwrap();
        assert_eq!(feed.len(), 3);
        assert_eq!(feed[0].message, "message 4");
        assert_eq!(feed[2].message, "message 2");
    }

    #[tokio::test]
    async fn mutations_on_missing_project_report_not_found() {
        let store = InMemoryStore::new();
        let missing = uuid::Uuid::new_v4();

        let err = store
            .set_project_status(missing, ProjectStatus::Paused)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "Project" }));
    }
}
