//! Transport boundary consumed by the session pumps.
//!
//! A connection is split into a reading half and a writing half so the two
//! pumps can own them independently. The hub never touches a transport; only
//! the pumps do. Implementations live in the application layer (e.g. the
//! axum WebSocket adapter).
//!
//! Uses native async fn in traits (Rust 2024 edition, no async_trait macro).

use thiserror::Error;

use super::session::OutboundFrame;

/// Failures reported by a transport half.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The peer went away without a clean close.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// The peer sent something the transport could not interpret.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A frame could not be written.
    #[error("write failed: {0}")]
    Write(String),
}

/// Reading half of a connection.
pub trait TransportReader: Send {
    /// Wait for the next inbound text payload.
    ///
    /// `Ok(None)` is a clean close by the peer.
    fn receive(
        &mut self,
    ) -> impl std::future::Future<Output = Result<Option<String>, TransportError>> + Send;
}

/// Writing half of a connection.
pub trait TransportWriter: Send {
    /// Write one serialized envelope.
    fn send(
        &mut self,
        frame: OutboundFrame,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;

    /// Send a close notification, if the transport has one.
    fn close(&mut self) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;
}
