//! Infrastructure layer for the campus chat server.
//!
//! Contains implementations of the repository traits defined in `campus-core`
//! (SQLite chat history), plus configuration loading and data directory
//! resolution.

pub mod config;
pub mod filesystem;
pub mod sqlite;
