//! Background writer that persists broadcast messages off the hot path.
//!
//! Inbound pumps hand each message to a [`HistoryRecorder`], which offers it
//! to a bounded queue drained by a single writer task. Broadcast never waits
//! on storage: when the queue is full the record is dropped with a warning,
//! and storage failures are logged without reaching any session.

use std::sync::Arc;

use campus_types::chat::ChatMessage;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::repository::HistoryRepository;
use super::service::HistoryService;

/// Cloneable handle for submitting messages to the history writer.
#[derive(Debug, Clone)]
pub struct HistoryRecorder {
    tx: mpsc::Sender<ChatMessage>,
}

impl HistoryRecorder {
    /// Start the writer task.
    ///
    /// The task ends once every recorder handle has been dropped and the
    /// queue is drained; its output is the number of messages persisted.
    pub fn spawn<R>(service: Arc<HistoryService<R>>, capacity: usize) -> (Self, JoinHandle<usize>)
    where
        R: HistoryRepository + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<ChatMessage>(capacity.max(1));
        let handle = tokio::spawn(async move {
            let mut persisted = 0usize;
            while let Some(message) = rx.recv().await {
                match service.append(&message).await {
                    Ok(id) => {
                        persisted += 1;
                        debug!(id, sender_id = %message.sender_id, "chat message persisted");
                    }
                    Err(err) => {
                        warn!(error = %err, sender_id = %message.sender_id, "failed to persist chat message");
                    }
                }
            }
            debug!(persisted, "history writer stopped");
            persisted
        });
        (Self { tx }, handle)
    }

    /// Queue a message for persistence without waiting.
    ///
    /// Returns `false` if the message was dropped.
    pub fn record(&self, message: ChatMessage) -> bool {
        match self.tx.try_send(message) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(message)) => {
                warn!(sender_id = %message.sender_id, "history queue full, message not persisted");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("history writer stopped, message not persisted");
                false
            }
        }
    }
}
