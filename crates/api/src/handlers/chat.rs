//! Handlers for the persistent project chat.
//!
//! Sending through this surface runs the same validation/gate/audit path as
//! the socket event and fans `chat:new` into the room, so both entry styles
//! converge on identical state.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use atelier_core::types::Id;

use crate::error::ApiResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// GET /chat/{project_id}
///
/// Chat history in creation-time order, sender-enriched.
pub async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let messages = state.mutator.messages(&user, project_id).await?;
    Ok(Json(DataResponse { data: messages }))
}

/// POST /chat/{project_id}
pub async fn send(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<Id>,
    Json(input): Json<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let message = state
        .mutator
        .send_chat(&user, project_id, &input.content, None)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: message })))
}
