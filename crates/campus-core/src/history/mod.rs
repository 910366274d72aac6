//! Chat history persistence abstractions.
//!
//! - `repository` -- `HistoryRepository` port implemented by campus-infra
//! - `service` -- `HistoryService` with pagination rules
//! - `recorder` -- `HistoryRecorder` background writer fed by inbound pumps

pub mod recorder;
pub mod repository;
pub mod service;

pub use recorder::HistoryRecorder;
pub use repository::HistoryRepository;
pub use service::{HistoryError, HistoryPage, HistoryService};
