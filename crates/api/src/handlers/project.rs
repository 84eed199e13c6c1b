//! Handlers for project CRUD, collaborators, status, annotations, canvas
//! versions, and the activity feed.
//!
//! Handlers stay thin: extract the authenticated identity, delegate to the
//! mutator (which owns gating, persistence, audit, and fan-out), wrap the
//! result in the response envelope.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use atelier_core::types::Id;

use crate::error::ApiResult;
use crate::middleware::auth::AuthUser;
use crate::mutator::NewAnnotation;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct AddCollaboratorRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveCanvasRequest {
    pub image_data: String,
    #[serde(default)]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /projects
///
/// Create a project; the caller becomes its client.
pub async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateProjectRequest>,
) -> ApiResult<impl IntoResponse> {
    let project = state
        .mutator
        .create_project(&user, &input.title, &input.description)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /projects
///
/// Projects the caller participates in, newest first.
pub async fn list_mine(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let projects = state.mutator.projects_for(&user).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /projects/{id}
pub async fn get(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let project = state.mutator.project(&user, id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// POST /projects/{id}/collaborators
///
/// Invite by email. Client/artist only.
pub async fn add_collaborator(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Json(input): Json<AddCollaboratorRequest>,
) -> ApiResult<impl IntoResponse> {
    let project = state
        .mutator
        .add_collaborator(&user, id, &input.email)
        .await?;
    Ok(Json(DataResponse { data: project }))
}

/// PATCH /projects/{id}/status
pub async fn update_status(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Json(input): Json<UpdateStatusRequest>,
) -> ApiResult<impl IntoResponse> {
    let project = state.mutator.update_status(&user, id, &input.status).await?;
    Ok(Json(DataResponse { data: project }))
}

/// POST /projects/{id}/milestones/{index}/annotations
pub async fn add_annotation(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((id, index)): Path<(Id, usize)>,
    Json(input): Json<NewAnnotation>,
) -> ApiResult<impl IntoResponse> {
    let annotation = state
        .mutator
        .append_annotation(&user, id, index, input)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: annotation })))
}

/// POST /projects/{id}/canvas
pub async fn save_canvas_version(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Json(input): Json<SaveCanvasRequest>,
) -> ApiResult<impl IntoResponse> {
    let version = state
        .mutator
        .append_canvas_version(&user, id, input.image_data, input.description)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: version })))
}

/// GET /projects/{id}/activity
///
/// Most-recent-first audit entries, capped at 200.
pub async fn activity(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let entries = state.mutator.activity_feed(&user, id).await?;
    Ok(Json(DataResponse { data: entries }))
}
