//! Projects and their embedded documents.
//!
//! A project is a commissioning engagement: exactly one client, at most one
//! artist, a set of collaborators, an ordered list of milestones (each with
//! its own assets and annotations), and a canvas version history. Embedded
//! documents are modified only through project-scoped operations; the store
//! layer is responsible for making the append-style ones atomic.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Id, Timestamp};

// ---------------------------------------------------------------------------
// Status enums
// ---------------------------------------------------------------------------

/// Lifecycle status of a project. `Active` is the creation default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Completed,
    Paused,
    Cancelled,
}

impl ProjectStatus {
    /// Parse a client-supplied status string. Anything outside the four
    /// allowed values is an input error, not a default.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "paused" => Ok(Self::Paused),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(CoreError::InvalidInput("Invalid status".into())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Paused => "paused",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Approval status of a single milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    Pending,
    InProgress,
    Submitted,
    Approved,
    Rejected,
}

/// Drawing tool used for an annotation overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationTool {
    Pen,
    Highlighter,
}

// ---------------------------------------------------------------------------
// Embedded documents
// ---------------------------------------------------------------------------

/// A drawing overlay plus required comment, attached to a milestone.
/// Immutable once appended; ordering is append order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    pub author: Id,
    pub tool: AnnotationTool,
    pub color: String,
    /// Base64-encoded snapshot of the drawing surface.
    pub image_data: Option<String>,
    pub comment: String,
    pub timestamp: Timestamp,
    pub milestone_index: usize,
}

/// A file delivered against a milestone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneAsset {
    pub url: String,
    pub filename: String,
    pub uploaded_by: Id,
    pub uploaded_at: Timestamp,
}

/// A deliverable checkpoint within a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    pub status: MilestoneStatus,
    #[serde(default)]
    pub assets: Vec<MilestoneAsset>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Milestone {
    /// A synthesized slot for grow-on-demand indexing. `position` is the
    /// zero-based index; titles are 1-based (`Milestone 1`, `Milestone 2`...).
    pub fn placeholder(position: usize) -> Self {
        Self {
            title: format!("Milestone {}", position + 1),
            description: None,
            due_date: None,
            amount: None,
            status: MilestoneStatus::Pending,
            assets: Vec::new(),
            annotations: Vec::new(),
        }
    }
}

/// One saved state of the shared drawing canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasVersion {
    pub image_data: String,
    pub created_by: Id,
    pub created_at: Timestamp,
    pub description: String,
}

/// The canvas version history plus the latest image payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanvasData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,
    #[serde(default)]
    pub versions: Vec<CanvasVersion>,
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// A commissioning engagement between a client and an artist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Id,
    pub title: String,
    pub description: String,
    /// Owning client. Exactly one; set at creation, never reassigned.
    pub client: Id,
    /// Commissioned artist, if one has been attached.
    pub artist: Option<Id>,
    /// Unique, unordered set of collaborator ids.
    #[serde(default)]
    pub collaborators: Vec<Id>,
    /// Normalized emails invited before the invitee had an account.
    #[serde(default)]
    pub pending_collaborator_emails: Vec<String>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    pub status: ProjectStatus,
    #[serde(default)]
    pub canvas: CanvasData,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// How a user relates to a project, for authorization decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantRole {
    Client,
    Artist,
    Collaborator,
}

impl Project {
    /// A fresh project owned by `client`, with defaults (active status,
    /// no milestones, empty canvas).
    pub fn new(title: String, description: String, client: Id) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: uuid::Uuid::new_v4(),
            title,
            description,
            client,
            artist: None,
            collaborators: Vec::new(),
            pending_collaborator_emails: Vec::new(),
            milestones: Vec::new(),
            status: ProjectStatus::Active,
            canvas: CanvasData::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The role `user` holds on this project, if any. A user holds at most
    /// one role; this checks client, then artist, then collaborators.
    pub fn role_of(&self, user: Id) -> Option<ParticipantRole> {
        if self.client == user {
            Some(ParticipantRole::Client)
        } else if self.artist == Some(user) {
            Some(ParticipantRole::Artist)
        } else if self.collaborators.contains(&user) {
            Some(ParticipantRole::Collaborator)
        } else {
            None
        }
    }
}

/// Grow `milestones` so that `index` is addressable, synthesizing default
/// slots for any intervening positions, and return the slot at `index`.
///
/// This is the explicit form of the original grow-on-demand indexing:
/// appending at index 3 of an empty list yields exactly four milestones,
/// the first three carrying placeholder titles.
pub fn ensure_milestone(milestones: &mut Vec<Milestone>, index: usize) -> &mut Milestone {
    while milestones.len() <= index {
        let position = milestones.len();
        milestones.push(Milestone::placeholder(position));
    }
    &mut milestones[index]
}
