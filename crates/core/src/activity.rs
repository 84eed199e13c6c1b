//! Immutable audit trail entries.
//!
//! Activity recording is best-effort by contract: a failed append is logged
//! and swallowed by the recorder, never surfaced to the triggering action.
//! This module only defines the record shape; the recorder lives with the
//! server since it needs the store.

use serde::{Deserialize, Serialize};

use crate::types::{Id, Timestamp};

/// Activity type tags. Free-form strings on the wire; these constants are
/// the ones the platform emits.
pub mod kind {
    pub const STATUS_CHANGED: &str = "status_changed";
    pub const ANNOTATION_ADDED: &str = "annotation_added";
    pub const COLLABORATOR_ADDED: &str = "collaborator_added";
    pub const COLLABORATOR_INVITED: &str = "collaborator_invited";
    pub const CHAT_MESSAGE: &str = "chat_message";
    pub const CANVAS_SAVED: &str = "canvas_saved";
}

/// Maximum number of entries returned by a single activity feed read.
pub const FEED_LIMIT: usize = 200;

/// Maximum length of the chat snippet embedded in an activity summary.
pub const SNIPPET_LEN: usize = 120;

/// An append-only audit record of a state-changing action. `actor` is
/// absent for system-generated entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: Id,
    pub project_id: Id,
    pub actor: Option<Id>,
    pub kind: String,
    pub message: String,
    pub meta: serde_json::Value,
    pub created_at: Timestamp,
}

impl ActivityEntry {
    pub fn new(
        project_id: Id,
        actor: Option<Id>,
        kind: &str,
        message: String,
        meta: serde_json::Value,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            project_id,
            actor,
            kind: kind.to_string(),
            message,
            meta,
            created_at: chrono::Utc::now(),
        }
    }
}

/// Truncate chat content for embedding in a human-readable summary.
/// Cuts on a character boundary, never mid-codepoint.
pub fn snippet(content: &str) -> String {
    content.chars().take(SNIPPET_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_is_untouched() {
        assert_eq!(snippet("hello"), "hello");
    }

    #[test]
    fn long_content_is_cut_to_the_limit() {
        let long = "x".repeat(500);
        assert_eq!(snippet(&long).chars().count(), SNIPPET_LEN);
    }

    #[test]
    fn multibyte_content_cuts_on_char_boundary() {
        let long = "é".repeat(200);
        let cut = snippet(&long);
        assert_eq!(cut.chars().count(), SNIPPET_LEN);
        assert!(cut.chars().all(|c| c == 'é'));
    }
}
