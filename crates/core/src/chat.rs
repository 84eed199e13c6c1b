//! Persistent project chat.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Id, Timestamp};

/// Origin of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    System,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::System => "system",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "text" => Ok(Self::Text),
            "system" => Ok(Self::System),
            _ => Err(CoreError::InvalidInput("Invalid message kind".into())),
        }
    }
}

/// One chat message within a project. Immutable once created; presented
/// in creation-time order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Id,
    pub project_id: Id,
    pub sender: Id,
    pub content: String,
    pub kind: MessageKind,
    pub created_at: Timestamp,
}

impl ChatMessage {
    /// A user-authored text message with a fresh id and server timestamp.
    pub fn text(project_id: Id, sender: Id, content: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            project_id,
            sender,
            content,
            kind: MessageKind::Text,
            created_at: chrono::Utc::now(),
        }
    }
}

/// Trim and validate chat content. Whitespace-only content is rejected
/// before anything touches the store.
pub fn validate_content(content: &str) -> Result<String, CoreError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidInput("Invalid message".into()));
    }
    Ok(trimmed.to_string())
}
