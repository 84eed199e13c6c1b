//! The identity capability: resolve a presented credential to a frozen
//! [`UserIdentity`] or fail.
//!
//! One resolver serves both entry points: the `AuthUser` extractor on the
//! request surface and the WebSocket handshake. A connection that fails to
//! resolve is refused -- there is no anonymous fallback.

use std::sync::Arc;

use atelier_core::error::CoreError;
use atelier_core::user::UserIdentity;
use atelier_store::Store;

use crate::auth::jwt::{validate_token, JwtConfig};

/// Resolves bearer tokens to user identities.
pub struct IdentityResolver {
    jwt: JwtConfig,
    store: Arc<dyn Store>,
}

impl IdentityResolver {
    pub fn new(jwt: JwtConfig, store: Arc<dyn Store>) -> Self {
        Self { jwt, store }
    }

    /// Validate the token and load the user it names.
    ///
    /// Both an invalid/expired token and a token naming an unknown user
    /// resolve to `Unauthorized`; a store fault is an internal error, not
    /// an authentication verdict.
    pub async fn resolve(&self, token: &str) -> Result<UserIdentity, CoreError> {
        let claims = validate_token(token, &self.jwt)
            .map_err(|_| CoreError::Unauthorized("Invalid or expired token".into()))?;

        let user = self
            .store
            .user_by_id(claims.sub)
            .await
            .map_err(|err| CoreError::Internal(format!("identity lookup failed: {err}")))?
            .ok_or_else(|| CoreError::Unauthorized("Unknown user".into()))?;

        Ok(user.identity())
    }
}
