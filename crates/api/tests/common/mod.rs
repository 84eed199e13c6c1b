//! Shared helpers for API integration tests.
//!
//! All tests run against [`InMemoryStore`]; the component graph is wired
//! exactly as `main.rs` wires it (via `AppState::new`), minus the network.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use atelier_api::auth::jwt::{generate_access_token, JwtConfig};
use atelier_api::config::ServerConfig;
use atelier_api::state::AppState;
use atelier_core::project::Project;
use atelier_core::user::User;
use atelier_store::memory::InMemoryStore;

/// Build a test `ServerConfig` with safe defaults and a fixed JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: String::new(),
        jwt: JwtConfig {
            secret: "api-test-secret".to_string(),
            access_token_expiry_hours: 1,
        },
    }
}

/// Full component graph over a fresh in-memory store.
pub fn test_state() -> AppState {
    AppState::new(Arc::new(InMemoryStore::new()), test_config())
}

/// Insert a user directly into the store.
///
/// The password hash is a placeholder; tests that exercise login register
/// through the API instead.
pub async fn seed_user(state: &AppState, name: &str, email: &str) -> User {
    let user = User {
        id: uuid::Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_string(),
        password_hash: "$argon2id$unused".to_string(),
        created_at: chrono::Utc::now(),
    };
    state.store.insert_user(&user).await.expect("insert user");
    user
}

/// Insert a project owned by `client` directly into the store.
pub async fn seed_project(state: &AppState, client: &User) -> Project {
    let project = Project::new(
        "Album cover".to_string(),
        "Commissioned cover artwork".to_string(),
        client.id,
    );
    state
        .store
        .insert_project(&project)
        .await
        .expect("insert project");
    project
}

/// Insert a project owned by `client` with `artist` attached.
pub async fn seed_project_with_artist(state: &AppState, client: &User, artist: &User) -> Project {
    let mut project = Project::new(
        "Album cover".to_string(),
        "Commissioned cover artwork".to_string(),
        client.id,
    );
    project.artist = Some(artist.id);
    state
        .store
        .insert_project(&project)
        .await
        .expect("insert project");
    project
}

/// A bearer token accepted by the test state's identity resolver.
pub fn token_for(state: &AppState, user: &User) -> String {
    generate_access_token(user.id, &state.config.jwt).expect("generate token")
}
