//! HTTP request handlers.

pub mod history;
pub mod presence;
pub mod ws;
