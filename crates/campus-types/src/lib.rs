//! Shared domain types for the campus chat hub.
//!
//! The chat envelope, session identity, configuration, and error types used
//! across the workspace.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod session;
