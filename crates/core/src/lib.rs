//! Atelier domain core.
//!
//! Pure domain model for the collaborative commissioning platform: user
//! identities, projects with their embedded milestones/annotations/canvas
//! history, chat messages, activity entries, and the access gate that every
//! mutation path consults. This crate has no I/O and no async -- the store
//! and server crates depend on it, never the other way around.

pub mod access;
pub mod activity;
pub mod chat;
pub mod error;
pub mod project;
pub mod types;
pub mod user;
