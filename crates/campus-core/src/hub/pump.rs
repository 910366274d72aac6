//! Per-session read and write pumps.
//!
//! Each registered session runs two independent tasks:
//!
//! - **Inbound:** reads payloads from the transport, wraps each one in a
//!   [`ChatMessage`] stamped with the session's user, and broadcasts it via
//!   the [`Hub`]. Any read failure is terminal and unregisters the session.
//! - **Outbound:** drains the session's [`OutboundQueue`] into the
//!   transport. A closed queue ends with a close notification; a write
//!   failure ends it immediately and wakes the inbound pump through the
//!   shared [`WriterLost`] signal. It never unregisters on its own.
//!
//! Unregistration stays on the inbound side, so it happens exactly once no
//! matter which half of the transport broke first.

use std::sync::Arc;
use std::time::Duration;

use campus_types::chat::ChatMessage;
use campus_types::session::SessionState;
use tokio::sync::Notify;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, trace, warn};

use super::registry::Hub;
use super::session::{OutboundQueue, Session};
use super::transport::{TransportError, TransportReader, TransportWriter};
use crate::history::HistoryRecorder;

/// Optional behavior for the inbound pump.
#[derive(Debug, Clone, Default)]
pub struct PumpOptions {
    /// Treat the session as dead after this long without an inbound frame.
    pub idle_timeout: Option<Duration>,
    /// Where to hand broadcast messages for persistence.
    pub recorder: Option<HistoryRecorder>,
}

/// Why an inbound pump stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundExit {
    /// The peer closed the connection cleanly.
    Closed,
    /// The transport failed.
    Failed(String),
    /// Nothing arrived within the idle timeout.
    IdleTimeout,
    /// The hub had already removed the session (e.g., it was too slow).
    Evicted,
    /// The outbound pump could not write to the transport.
    WriterLost,
}

/// Why an outbound pump stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundExit {
    /// The queue was closed and fully drained.
    QueueClosed,
    /// Writing to the transport failed.
    WriteFailed(String),
}

/// Raised by the outbound pump when a write fails, observed by the inbound
/// pump of the same session.
#[derive(Debug, Clone, Default)]
pub struct WriterLost(Arc<Notify>);

impl WriterLost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the writer as gone. The permit is kept until the inbound pump
    /// next waits, so the signal cannot be missed.
    pub fn raise(&self) {
        self.0.notify_one();
    }

    async fn wait(&self) {
        self.0.notified().await
    }
}

/// One read from `reader`, bounded by the optional idle timeout.
enum Received {
    Frame(Result<Option<String>, TransportError>),
    Idle,
}

async fn receive_within<R: TransportReader>(reader: &mut R, idle: Option<Duration>) -> Received {
    match idle {
        Some(limit) => match tokio::time::timeout(limit, reader.receive()).await {
            Ok(result) => Received::Frame(result),
            Err(_) => Received::Idle,
        },
        None => Received::Frame(reader.receive().await),
    }
}

/// Read from `reader` and broadcast until the transport ends or `writer_lost`
/// is raised.
///
/// Unregisters `session` exactly once on the way out and drops the reader.
pub async fn run_inbound<R: TransportReader>(
    hub: Arc<Hub>,
    session: Session,
    mut reader: R,
    options: PumpOptions,
    writer_lost: WriterLost,
) -> InboundExit {
    let exit = loop {
        let next = tokio::select! {
            received = receive_within(&mut reader, options.idle_timeout) => match received {
                Received::Frame(result) => result,
                Received::Idle => break InboundExit::IdleTimeout,
            },
            () = writer_lost.wait() => break InboundExit::WriterLost,
        };

        let content = match next {
            Ok(Some(content)) => content,
            Ok(None) => break InboundExit::Closed,
            Err(err) => break InboundExit::Failed(err.to_string()),
        };

        if !hub.contains(&session) {
            break InboundExit::Evicted;
        }

        let message = ChatMessage::new(content, session.user_id());
        match hub.broadcast(&message) {
            Ok(report) => trace!(
                session_id = %session.id(),
                delivered = report.delivered,
                dropped = report.dropped(),
                "inbound message broadcast"
            ),
            Err(err) => {
                warn!(session_id = %session.id(), error = %err, "failed to broadcast message");
                continue;
            }
        }

        if let Some(recorder) = &options.recorder {
            recorder.record(message);
        }
    };

    hub.unregister(&session);
    drop(reader);

    match &exit {
        InboundExit::Failed(err) => {
            warn!(session_id = %session.id(), error = %err, "inbound transport failed")
        }
        InboundExit::IdleTimeout => {
            debug!(session_id = %session.id(), "session idle timeout")
        }
        InboundExit::WriterLost => {
            debug!(session_id = %session.id(), "outbound transport lost; session released")
        }
        other => debug!(session_id = %session.id(), exit = ?other, "inbound pump stopped"),
    }
    exit
}

/// Drain `queue` into `writer` until the queue closes or a write fails.
///
/// A failed write raises `writer_lost` so the inbound pump releases the
/// session.
pub async fn run_outbound<W: TransportWriter>(
    mut queue: OutboundQueue,
    mut writer: W,
    writer_lost: WriterLost,
) -> OutboundExit {
    while let Some(frame) = queue.recv().await {
        if let Err(err) = writer.send(frame).await {
            debug!(session_id = %queue.session_id(), error = %err, "outbound write failed");
            writer_lost.raise();
            return OutboundExit::WriteFailed(err.to_string());
        }
    }

    if let Err(err) = writer.close().await {
        debug!(session_id = %queue.session_id(), error = %err, "close notification not delivered");
    }
    debug!(session_id = %queue.session_id(), "outbound pump stopped");
    OutboundExit::QueueClosed
}

/// Join handles for both pumps of one session.
#[derive(Debug)]
pub struct SessionTasks {
    session: Session,
    inbound: JoinHandle<InboundExit>,
    outbound: JoinHandle<OutboundExit>,
}

impl SessionTasks {
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current lifecycle state, derived from hub membership and task status.
    pub fn state(&self, hub: &Hub) -> SessionState {
        if hub.contains(&self.session) {
            SessionState::Active
        } else if self.inbound.is_finished() && self.outbound.is_finished() {
            SessionState::Closed
        } else {
            SessionState::Draining
        }
    }

    /// Wait for both pumps to exit.
    pub async fn join(self) -> Result<(InboundExit, OutboundExit), JoinError> {
        let (inbound, outbound) = tokio::join!(self.inbound, self.outbound);
        Ok((inbound?, outbound?))
    }
}

/// Start the inbound and outbound pumps for a freshly registered session.
pub fn spawn_session<R, W>(
    hub: Arc<Hub>,
    session: Session,
    queue: OutboundQueue,
    reader: R,
    writer: W,
    options: PumpOptions,
) -> SessionTasks
where
    R: TransportReader + 'static,
    W: TransportWriter + 'static,
{
    let writer_lost = WriterLost::new();
    let outbound = tokio::spawn(run_outbound(queue, writer, writer_lost.clone()));
    let inbound = tokio::spawn(run_inbound(
        hub,
        session.clone(),
        reader,
        options,
        writer_lost,
    ));
    SessionTasks {
        session,
        inbound,
        outbound,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
