//! Core of the campus chat server.
//!
//! The broadcast hub and session pumps, plus the "ports" (repository traits)
//! that the infrastructure layer implements. It depends only on
//! `campus-types` and tokio -- never on `campus-infra` or any database/IO crate.

pub mod history;
pub mod hub;
