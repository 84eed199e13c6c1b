//! WebSocket collaboration layer.
//!
//! Provides the room registry (connection + room fan-out bookkeeping), the
//! per-connection session state, the wire protocol types, the collaboration
//! hub that dispatches client events, heartbeat monitoring, and the HTTP
//! upgrade handler used by the router.

pub mod handler;
pub mod heartbeat;
pub mod hub;
pub mod protocol;
pub mod rooms;
pub mod session;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use hub::CollaborationHub;
pub use rooms::RoomRegistry;
pub use session::RealtimeSession;
