use crate::types::Id;

/// Domain error taxonomy shared by both mutation paths (request-style and
/// socket-style). Every operation failure surfaces as one of these; handlers
/// map them to HTTP statuses, the hub maps them to negative acks.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Id },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
