use std::sync::Arc;

use atelier_store::Store;

use crate::activity::ActivityRecorder;
use crate::auth::identity::IdentityResolver;
use crate::config::ServerConfig;
use crate::mutator::ProjectMutator;
use crate::ws::{CollaborationHub, RoomRegistry};

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// Constructed exactly once at process start and passed to every
/// connection handler; there is no ambient singleton. Cheaply cloneable
/// (all inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// The persistence capability.
    pub store: Arc<dyn Store>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Credential-to-identity resolution, shared by the request extractor
    /// and the WebSocket handshake.
    pub identity: Arc<IdentityResolver>,
    /// Connection and room bookkeeping for the realtime channel.
    pub rooms: Arc<RoomRegistry>,
    /// Realtime event dispatch.
    pub hub: Arc<CollaborationHub>,
    /// The authorized request-path mutation component.
    pub mutator: Arc<ProjectMutator>,
}

impl AppState {
    /// Wire up the full component graph over the given store.
    pub fn new(store: Arc<dyn Store>, config: ServerConfig) -> Self {
        let rooms = Arc::new(RoomRegistry::new());
        let recorder = ActivityRecorder::new(Arc::clone(&store));
        let mutator = Arc::new(ProjectMutator::new(
            Arc::clone(&store),
            Arc::clone(&rooms),
            recorder,
        ));
        let identity = Arc::new(IdentityResolver::new(config.jwt.clone(), Arc::clone(&store)));
        let hub = Arc::new(CollaborationHub::new(
            Arc::clone(&store),
            Arc::clone(&rooms),
            Arc::clone(&mutator),
        ));

        Self {
            store,
            config: Arc::new(config),
            identity,
            rooms,
            hub,
            mutator,
        }
    }
}
