//! The access gate: the single authorization predicate for project state.
//!
//! Both mutation paths (the WebSocket hub and the request-style mutator)
//! consult these functions and nothing else. The predicate is deliberately
//! pure -- it takes an already-loaded project and an already-resolved user
//! id, so the decision is identical regardless of which path asked.

use crate::project::{ParticipantRole, Project};
use crate::types::Id;

/// Outcome of a gate check. Denials carry the human-readable reason used in
/// error responses and negative acks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Denied(&'static str),
}

impl Access {
    pub fn is_granted(&self) -> bool {
        matches!(self, Access::Granted)
    }

    /// The denial reason, if any.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Access::Granted => None,
            Access::Denied(reason) => Some(reason),
        }
    }
}

/// Participant-level check: client, artist, or collaborator.
///
/// Pending-invitation emails grant nothing -- an invited-but-unregistered
/// user has no access until their account is linked.
pub fn can_access(user: Id, project: &Project) -> Access {
    match project.role_of(user) {
        Some(_) => Access::Granted,
        None => Access::Denied("Not authorized"),
    }
}

/// Owner-level check: client or artist only. Collaborators may not, for
/// example, invite further collaborators.
pub fn can_manage(user: Id, project: &Project) -> Access {
    match project.role_of(user) {
        Some(ParticipantRole::Client) | Some(ParticipantRole::Artist) => Access::Granted,
        _ => Access::Denied("Only the client or artist can do this"),
    }
}
