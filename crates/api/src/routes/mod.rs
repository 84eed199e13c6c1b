pub mod health;

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                            WebSocket (token in query)
///
/// /auth/register                                 register (public)
/// /auth/login                                    login (public)
///
/// /projects                                      list mine, create
/// /projects/{id}                                 get
/// /projects/{id}/status                          update status (PATCH)
/// /projects/{id}/collaborators                   invite by email (POST)
/// /projects/{id}/milestones/{index}/annotations  append annotation (POST)
/// /projects/{id}/canvas                          append canvas version (POST)
/// /projects/{id}/activity                        activity feed (GET)
///
/// /chat/{project_id}                             list, send
/// ```
///
/// Everything except `/auth/*` requires a resolved identity.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route(
            "/projects",
            get(handlers::project::list_mine).post(handlers::project::create),
        )
        .route("/projects/{id}", get(handlers::project::get))
        .route(
            "/projects/{id}/status",
            patch(handlers::project::update_status),
        )
        .route(
            "/projects/{id}/collaborators",
            post(handlers::project::add_collaborator),
        )
        .route(
            "/projects/{id}/milestones/{index}/annotations",
            post(handlers::project::add_annotation),
        )
        .route(
            "/projects/{id}/canvas",
            post(handlers::project::save_canvas_version),
        )
        .route("/projects/{id}/activity", get(handlers::project::activity))
        .route(
            "/chat/{project_id}",
            get(handlers::chat::list).post(handlers::chat::send),
        )
}
