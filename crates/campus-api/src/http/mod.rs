//! HTTP layer for the chat server.
//!
//! A WebSocket endpoint at `/ws` plus a small REST API at `/api/v1/chat/`,
//! with caller identity, envelope responses and CORS.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
