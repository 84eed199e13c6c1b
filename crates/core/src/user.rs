//! User identities and the store-side user record.
//!
//! A [`UserIdentity`] is the frozen, resolved form every authorization
//! decision uses. The full [`User`] record (with its password hash) never
//! leaves the store/auth layer.

use serde::{Deserialize, Serialize};

use crate::types::{Id, Timestamp};

/// An authenticated user reference: the only user shape the collaboration
/// core ever sees. Resolved once (at login or WebSocket handshake) and
/// treated as immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: Id,
    pub name: String,
    pub email: String,
}

/// Store-side user record. Email is persisted normalized (lowercase,
/// trimmed) so invite matching never depends on caller casing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: Timestamp,
}

impl User {
    /// The public identity slice of this record.
    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Normalize an email for storage and comparison: trim whitespace and
/// lowercase. Pending-invitation matching is defined over this form.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic shape check: one `@` with a non-empty local part and a dot in the
/// domain. Deliverability is not verified here.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !local.contains(char::is_whitespace)
        && !domain.contains(char::is_whitespace)
        && !domain.contains('@')
        && domain.split('.').count() >= 2
        && domain.split('.').all(|part| !part.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn valid_emails_pass() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.co"));
    }

    #[test]
    fn invalid_emails_fail() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ada@"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada@exa mple.com"));
        assert!(!is_valid_email("ada@example..com"));
    }
}
