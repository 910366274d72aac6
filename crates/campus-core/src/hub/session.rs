//! Session handle and the consumer half of its outbound queue.

use std::sync::Arc;

use campus_types::session::{SessionId, UserId};
use tokio::sync::mpsc;

/// One serialized envelope, shared by every queue it was fanned out to.
pub type OutboundFrame = Arc<str>;

/// Identity of one registered connection.
///
/// Cheap to clone; the inbound pump keeps one to broadcast under and to
/// unregister with. The generation distinguishes this registration from any
/// later one that reuses the same id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: SessionId,
    user_id: UserId,
    generation: u64,
}

impl Session {
    pub(crate) fn new(id: SessionId, user_id: UserId, generation: u64) -> Self {
        Self {
            id,
            user_id,
            generation,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }
}

/// Receiving end of a session's bounded outbound queue.
///
/// Only the owning session's outbound pump reads from it. Once the hub
/// drops the session, `recv` yields the frames already buffered and then
/// `None`, which is the clean end-of-stream signal.
#[derive(Debug)]
pub struct OutboundQueue {
    session_id: SessionId,
    rx: mpsc::Receiver<OutboundFrame>,
}

impl OutboundQueue {
    pub(crate) fn new(session_id: SessionId, rx: mpsc::Receiver<OutboundFrame>) -> Self {
        Self { session_id, rx }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Wait for the next frame. `None` means the queue is closed and empty.
    pub async fn recv(&mut self) -> Option<OutboundFrame> {
        self.rx.recv().await
    }

    /// Take a frame without waiting.
    pub fn try_recv(&mut self) -> Result<OutboundFrame, mpsc::error::TryRecvError> {
        self.rx.try_recv()
    }
}
