//! Broadcast registry that owns the set of live chat sessions.
//!
//! Every connected session is represented by an entry holding the only
//! producer half of its bounded outbound queue. Register, unregister, and
//! the iterate-and-enqueue pass of broadcast all run under one mutex, so no
//! operation ever observes a half-updated set and a session can never be
//! offered a message after its queue was closed.
//!
//! Enqueueing is strictly non-blocking (`try_send`). A session whose queue is
//! full is considered dead: it is removed in the same pass, which drops its
//! sender and closes the queue. One slow client therefore never delays
//! delivery to anyone else.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use campus_types::chat::ChatMessage;
use campus_types::session::{SessionId, UserId};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::session::{OutboundFrame, OutboundQueue, Session};

/// Default per-session outbound buffer, in messages.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;

/// Errors returned by hub operations.
#[derive(Debug, Error)]
pub enum HubError {
    /// A live session already uses this id. The existing session is untouched.
    #[error("session {0} is already registered")]
    DuplicateSession(SessionId),

    /// The envelope could not be encoded as JSON.
    #[error("failed to serialize chat message: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Outcome of one broadcast pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Sessions the message was enqueued for.
    pub delivered: usize,
    /// Sessions removed because their outbound queue was full.
    pub dropped_slow: Vec<SessionId>,
    /// Sessions removed because their outbound pump had already gone away.
    pub dropped_closed: Vec<SessionId>,
}

impl BroadcastReport {
    pub fn dropped(&self) -> usize {
        self.dropped_slow.len() + self.dropped_closed.len()
    }
}

struct Member {
    user_id: UserId,
    generation: u64,
    outbound: mpsc::Sender<OutboundFrame>,
}

#[derive(Default)]
struct Registry {
    members: HashMap<SessionId, Member>,
    next_generation: u64,
}

/// Central registry performing registration and fan-out.
///
/// Construct one per process and share it as `Arc<Hub>`.
pub struct Hub {
    registry: Mutex<Registry>,
    capacity: usize,
}

impl Hub {
    /// Create a hub whose sessions buffer up to `capacity` outbound messages.
    ///
    /// A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().expect("hub registry lock poisoned")
    }

    /// Register a new session and return it with the consumer half of its queue.
    ///
    /// The hub keeps the only producer half. Registering an id that is
    /// already live fails with [`HubError::DuplicateSession`].
    pub fn register(
        &self,
        id: SessionId,
        user_id: UserId,
    ) -> Result<(Session, OutboundQueue), HubError> {
        let mut registry = self.lock();
        if registry.members.contains_key(&id) {
            warn!(session_id = %id, %user_id, "rejecting duplicate session registration");
            return Err(HubError::DuplicateSession(id));
        }

        let generation = registry.next_generation;
        registry.next_generation += 1;

        let (tx, rx) = mpsc::channel(self.capacity);
        registry.members.insert(
            id.clone(),
            Member {
                user_id,
                generation,
                outbound: tx,
            },
        );
        let live = registry.members.len();
        drop(registry);

        info!(session_id = %id, %user_id, live, "session registered");
        Ok((
            Session::new(id.clone(), user_id, generation),
            OutboundQueue::new(id, rx),
        ))
    }

    /// Remove a session and close its outbound queue.
    ///
    /// Idempotent: returns `true` only for the call that performed the
    /// removal. A stale handle never removes a newer session that reuses
    /// the same id.
    pub fn unregister(&self, session: &Session) -> bool {
        let mut registry = self.lock();
        let owned = registry
            .members
            .get(session.id())
            .is_some_and(|m| m.generation == session.generation());
        if !owned {
            return false;
        }
        registry.members.remove(session.id());
        let live = registry.members.len();
        drop(registry);

        info!(session_id = %session.id(), user_id = %session.user_id(), live, "session unregistered");
        true
    }

    /// Serialize `message` once and offer it to every live session.
    pub fn broadcast(&self, message: &ChatMessage) -> Result<BroadcastReport, HubError> {
        let frame: OutboundFrame = serde_json::to_string(message)?.into();
        Ok(self.broadcast_frame(frame))
    }

    /// Offer an already-serialized frame to every live session.
    ///
    /// Sessions whose queue is full or whose consumer is gone are removed
    /// during the same pass.
    pub fn broadcast_frame(&self, frame: OutboundFrame) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let mut registry = self.lock();

        registry.members.retain(|id, member| {
            match member.outbound.try_send(Arc::clone(&frame)) {
                Ok(()) => {
                    report.delivered += 1;
                    true
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(
                        session_id = %id,
                        user_id = %member.user_id,
                        capacity = self.capacity,
                        "outbound queue full, dropping slow session"
                    );
                    report.dropped_slow.push(id.clone());
                    false
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(session_id = %id, "outbound pump gone, removing session");
                    report.dropped_closed.push(id.clone());
                    false
                }
            }
        });
        drop(registry);

        debug!(
            delivered = report.delivered,
            dropped = report.dropped(),
            "broadcast complete"
        );
        report
    }

    /// Unregister every session. Used on process shutdown.
    ///
    /// Returns the number of sessions that were closed.
    pub fn shutdown(&self) -> usize {
        let mut registry = self.lock();
        let closed = registry.members.len();
        registry.members.clear();
        drop(registry);

        if closed > 0 {
            info!(closed, "hub shut down, all sessions closed");
        }
        closed
    }

    /// Whether this exact session (not just its id) is still registered.
    pub fn contains(&self, session: &Session) -> bool {
        self.lock()
            .members
            .get(session.id())
            .is_some_and(|m| m.generation == session.generation())
    }

    /// Whether any live session uses `id`.
    pub fn is_registered(&self, id: &SessionId) -> bool {
        self.lock().members.contains_key(id)
    }

    pub fn session_count(&self) -> usize {
        self.lock().members.len()
    }

    /// Distinct users with at least one live session, in ascending order.
    pub fn connected_users(&self) -> Vec<UserId> {
        self.lock()
            .members
            .values()
            .map(|m| m.user_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(DEFAULT_OUTBOUND_CAPACITY)
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("sessions", &self.session_count())
            .field("capacity", &self.capacity)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::error::TryRecvError;

    fn decode(frame: &OutboundFrame) -> ChatMessage {
        serde_json::from_str(frame).unwrap()
    }

    fn register(hub: &Hub, id: &str, user: i64) -> (Session, OutboundQueue) {
        hub.register(SessionId::from(id), UserId(user)).unwrap()
    }

    #[test]
    fn register_makes_session_live() {
        let hub = Hub::new(8);
        let (s1, _q1) = register(&hub, "s1", 1);

        assert!(hub.contains(&s1));
        assert!(hub.is_registered(&SessionId::from("s1")));
        assert_eq!(hub.session_count(), 1);
    }

    #[test]
    fn duplicate_registration_is_rejected_and_existing_kept() {
        let hub = Hub::new(8);
        let (s1, mut q1) = register(&hub, "dup", 1);

        let result = hub.register(SessionId::from("dup"), UserId(2));
        assert!(matches!(result, Err(HubError::DuplicateSession(ref id)) if id.as_str() == "dup"));

        assert!(hub.contains(&s1));
        hub.broadcast(&ChatMessage::new("still here", UserId(1))).unwrap();
        assert_eq!(decode(&q1.try_recv().unwrap()).content, "still here");
    }

    #[test]
    fn fan_out_reaches_every_session_once() {
        let hub = Hub::new(8);
        let mut queues: Vec<_> = (0..5).map(|i| register(&hub, &format!("s{i}"), i).1).collect();

        let report = hub.broadcast(&ChatMessage::new("hi all", UserId(0))).unwrap();
        assert_eq!(report.delivered, 5);
        assert_eq!(report.dropped(), 0);

        for q in &mut queues {
            assert_eq!(decode(&q.try_recv().unwrap()).content, "hi all");
            assert!(matches!(q.try_recv(), Err(TryRecvError::Empty)));
        }
    }

    #[test]
    fn broadcast_with_no_sessions_is_noop() {
        let hub = Hub::default();
        let report = hub.broadcast(&ChatMessage::new("nobody", UserId(1))).unwrap();
        assert_eq!(report, BroadcastReport::default());
    }

    #[test]
    fn unregister_is_idempotent() {
        let hub = Hub::new(8);
        let (s1, _q1) = register(&hub, "s1", 1);
        let (_s2, _q2) = register(&hub, "s2", 2);

        assert!(hub.unregister(&s1));
        assert!(!hub.unregister(&s1));
        assert_eq!(hub.session_count(), 1);
        assert!(!hub.contains(&s1));
    }

    #[test]
    fn unregister_closes_queue_after_buffered_messages() {
        let hub = Hub::new(8);
        let (s1, mut q1) = register(&hub, "s1", 1);

        hub.broadcast(&ChatMessage::new("before", UserId(1))).unwrap();
        hub.unregister(&s1);

        assert_eq!(decode(&q1.try_recv().unwrap()).content, "before");
        assert!(matches!(q1.try_recv(), Err(TryRecvError::Disconnected)));
    }

    #[test]
    fn no_delivery_after_unregister() {
        let hub = Hub::new(8);
        let (s1, mut q1) = register(&hub, "s1", 1);
        let (_s2, mut q2) = register(&hub, "s2", 2);

        hub.unregister(&s1);
        let report = hub.broadcast(&ChatMessage::new("after", UserId(2))).unwrap();

        assert_eq!(report.delivered, 1);
        assert!(matches!(q1.try_recv(), Err(TryRecvError::Disconnected)));
        assert_eq!(decode(&q2.try_recv().unwrap()).content, "after");
    }

    #[test]
    fn stale_handle_does_not_remove_reused_id() {
        let hub = Hub::new(8);
        let (old, _old_q) = register(&hub, "addr", 1);
        assert!(hub.unregister(&old));

        let (new, _new_q) = register(&hub, "addr", 1);
        assert!(!hub.unregister(&old));
        assert!(hub.contains(&new));
        assert!(!hub.contains(&old));
    }

    #[test]
    fn full_queue_drops_only_the_slow_session() {
        let hub = Hub::new(2);
        let (slow, _slow_q) = register(&hub, "slow", 1);
        let (fast, mut fast_q) = register(&hub, "fast", 2);

        for i in 0..2 {
            hub.broadcast(&ChatMessage::new(format!("m{i}"), UserId(3))).unwrap();
            decode(&fast_q.try_recv().unwrap());
        }

        let report = hub.broadcast(&ChatMessage::new("overflow", UserId(3))).unwrap();
        assert_eq!(report.delivered, 1);
        assert_eq!(report.dropped_slow, vec![slow.id().clone()]);

        assert!(!hub.contains(&slow));
        assert!(hub.contains(&fast));
        assert_eq!(decode(&fast_q.try_recv().unwrap()).content, "overflow");
    }

    #[test]
    fn dropped_slow_session_still_drains_buffer_then_ends() {
        let hub = Hub::new(1);
        let (_slow, mut slow_q) = register(&hub, "slow", 1);

        hub.broadcast(&ChatMessage::new("kept", UserId(2))).unwrap();
        hub.broadcast(&ChatMessage::new("lost", UserId(2))).unwrap();

        assert_eq!(decode(&slow_q.try_recv().unwrap()).content, "kept");
        assert!(matches!(slow_q.try_recv(), Err(TryRecvError::Disconnected)));
    }

    #[test]
    fn closed_consumer_is_removed_on_next_broadcast() {
        let hub = Hub::new(4);
        let (gone, gone_q) = register(&hub, "gone", 1);
        drop(gone_q);

        let report = hub.broadcast(&ChatMessage::new("ping", UserId(2))).unwrap();
        assert_eq!(report.delivered, 0);
        assert_eq!(report.dropped_closed, vec![gone.id().clone()]);
        assert!(!hub.contains(&gone));
    }

    #[test]
    fn order_is_preserved_per_sender() {
        let hub = Hub::new(8);
        let (_a, mut qa) = register(&hub, "a", 1);
        let (_b, mut qb) = register(&hub, "b", 2);

        for text in ["m1", "m2", "m3"] {
            hub.broadcast(&ChatMessage::new(text, UserId(1))).unwrap();
        }

        for q in [&mut qa, &mut qb] {
            let got: Vec<String> = (0..3).map(|_| decode(&q.try_recv().unwrap()).content).collect();
            assert_eq!(got, vec!["m1", "m2", "m3"]);
        }
    }

    #[test]
    fn shutdown_closes_every_queue() {
        let hub = Hub::new(4);
        let (_s1, mut q1) = register(&hub, "s1", 1);
        let (_s2, mut q2) = register(&hub, "s2", 2);

        assert_eq!(hub.shutdown(), 2);
        assert_eq!(hub.session_count(), 0);
        assert!(matches!(q1.try_recv(), Err(TryRecvError::Disconnected)));
        assert!(matches!(q2.try_recv(), Err(TryRecvError::Disconnected)));
    }

    #[test]
    fn connected_users_are_distinct_and_sorted() {
        let hub = Hub::new(4);
        let _a = register(&hub, "a", 5);
        let _b = register(&hub, "b", 2);
        let _c = register(&hub, "c", 5);

        assert_eq!(hub.connected_users(), vec![UserId(2), UserId(5)]);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let hub = Hub::new(0);
        assert_eq!(hub.capacity(), 1);
    }

    #[tokio::test]
    async fn concurrent_unregister_and_broadcast_stay_consistent() {
        let hub = Arc::new(Hub::new(64));
        let mut handles = Vec::new();
        let mut queues = Vec::new();

        for i in 0..16 {
            let (session, queue) = register(&hub, &format!("s{i}"), i);
            queues.push(queue);

            let hub_a = Arc::clone(&hub);
            let hub_b = Arc::clone(&hub);
            let twin = session.clone();
            handles.push(tokio::spawn(async move { hub_a.unregister(&session) }));
            handles.push(tokio::spawn(async move { hub_b.unregister(&twin) }));

            let hub_c = Arc::clone(&hub);
            handles.push(tokio::spawn(async move {
                hub_c.broadcast(&ChatMessage::new("race", UserId(99))).unwrap();
                false
            }));
        }

        let mut removals = 0;
        for handle in handles {
            if handle.await.unwrap() {
                removals += 1;
            }
        }

        assert_eq!(removals, 16);
        assert_eq!(hub.session_count(), 0);
        for mut q in queues {
            while let Ok(frame) = q.try_recv() {
                assert_eq!(decode(&frame).content, "race");
            }
            assert!(matches!(q.try_recv(), Err(TryRecvError::Disconnected)));
        }
    }

    #[test]
    fn debug_impl() {
        let hub = Hub::new(4);
        let debug = format!("{hub:?}");
        assert!(debug.contains("Hub"));
        assert!(debug.contains("sessions"));
    }
}
