//! Authentication building blocks: JWT access tokens, Argon2id password
//! hashing, and the identity resolver shared by the HTTP extractor and the
//! WebSocket handshake.

pub mod identity;
pub mod jwt;
pub mod password;
