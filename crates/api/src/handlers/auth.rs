//! Handlers for identity creation and login.
//!
//! Registration is retained in the core surface because pending-invitation
//! resolution is contractually part of the identity-creation flow: a newly
//! linked email pulls its invites out of every project's pending set.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use atelier_core::error::CoreError;
use atelier_core::user::{is_valid_email, normalize_email, User, UserIdentity};

use crate::auth::jwt::generate_access_token;
use crate::auth::password::{hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LEN};
use crate::error::{ApiError, ApiResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token plus the public identity, returned by both register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserIdentity,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /auth/register
///
/// Create a local account, then resolve any pending collaboration invites
/// for the new email (best effort -- a failure there never fails the
/// registration).
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let name = input.name.trim();
    if name.is_empty() || input.email.trim().is_empty() || input.password.is_empty() {
        return Err(ApiError::Core(CoreError::InvalidInput(
            "All fields required".into(),
        )));
    }

    let email = normalize_email(&input.email);
    if !is_valid_email(&email) {
        return Err(ApiError::Core(CoreError::InvalidInput(
            "Please enter a valid email".into(),
        )));
    }

    validate_password_strength(&input.password, MIN_PASSWORD_LEN)
        .map_err(|msg| ApiError::Core(CoreError::InvalidInput(msg)))?;

    if state.store.user_by_email(&email).await?.is_some() {
        return Err(ApiError::Core(CoreError::Conflict(
            "User already exists".into(),
        )));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|err| ApiError::Internal(format!("password hashing failed: {err}")))?;

    let user = User {
        id: uuid::Uuid::new_v4(),
        name: name.to_string(),
        email,
        password_hash,
        created_at: chrono::Utc::now(),
    };
    state.store.insert_user(&user).await?;

    tracing::info!(user_id = %user.id, "User registered");

    // Best-effort invite resolution; never blocks the registration.
    match state.store.attach_pending_invites(&user.email, user.id).await {
        Ok(attached) if attached > 0 => {
            tracing::info!(user_id = %user.id, attached, "Attached pending collaborations");
        }
        Ok(_) => {}
        Err(err) => {
            tracing::warn!(user_id = %user.id, error = %err, "Failed to attach pending collaborations");
        }
    }

    let token = generate_access_token(user.id, &state.config.jwt)
        .map_err(|err| ApiError::Internal(format!("token generation failed: {err}")))?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: AuthResponse {
                token,
                user: user.identity(),
            },
        }),
    ))
}

/// POST /auth/login
///
/// Verify credentials and issue an access token. Unknown email and wrong
/// password answer identically.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = normalize_email(&input.email);
    if email.is_empty() || input.password.is_empty() {
        return Err(ApiError::Core(CoreError::InvalidInput(
            "All fields required".into(),
        )));
    }

    let invalid = || ApiError::Core(CoreError::Unauthorized("Invalid credentials".into()));

    let user = state
        .store
        .user_by_email(&email)
        .await?
        .ok_or_else(invalid)?;

    let verified = verify_password(&input.password, &user.password_hash)
        .map_err(|err| ApiError::Internal(format!("password verification failed: {err}")))?;
    if !verified {
        return Err(invalid());
    }

    let token = generate_access_token(user.id, &state.config.jwt)
        .map_err(|err| ApiError::Internal(format!("token generation failed: {err}")))?;

    Ok(Json(DataResponse {
        data: AuthResponse {
            token,
            user: user.identity(),
        },
    }))
}
