//! Publish/subscribe channel that carries session patches between clients.
//!
//! Delivery is at-least-once with per-field ordering only, so consumers must
//! tolerate duplicates and must not infer that two fields changed together.

use async_trait::async_trait;
use quiz_core::model::{SessionId, SessionPatch};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChannelError {
    #[error("channel closed")]
    Closed,

    #[error("connection error: {0}")]
    Connection(String),
}

//
// ─── SUBSCRIPTION ──────────────────────────────────────────────────────────────
//

type UnsubscribeHook = Box<dyn FnOnce() + Send>;

/// Live subscription to one session's patches.
///
/// Dropping the subscription unsubscribes; no further patches are delivered.
pub struct Subscription {
    session_id: SessionId,
    receiver: mpsc::UnboundedReceiver<SessionPatch>,
    on_unsubscribe: Option<UnsubscribeHook>,
}

impl Subscription {
    #[must_use]
    pub fn new(
        session_id: SessionId,
        receiver: mpsc::UnboundedReceiver<SessionPatch>,
        on_unsubscribe: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            session_id,
            receiver,
            on_unsubscribe: Some(Box::new(on_unsubscribe)),
        }
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Wait for the next patch. Returns `None` once the channel side is gone.
    pub async fn recv(&mut self) -> Option<SessionPatch> {
        self.receiver.recv().await
    }

    /// Take an already delivered patch without waiting.
    pub fn try_recv(&mut self) -> Option<SessionPatch> {
        self.receiver.try_recv().ok()
    }

    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(hook) = self.on_unsubscribe.take() {
            hook();
        }
        self.receiver.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("session_id", &self.session_id)
            .field("active", &self.on_unsubscribe.is_some())
            .finish_non_exhaustive()
    }
}

//
// ─── CONTRACT ──────────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait SyncChannel: Send + Sync {
    /// Start receiving patches published for `session_id`.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError` if the subscription cannot be registered.
    async fn subscribe(&self, session_id: SessionId) -> Result<Subscription, ChannelError>;

    /// Deliver a patch to every subscriber of `session_id`, the publisher's own
    /// subscription included.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError` if the patch could not be handed to the channel.
    async fn publish(
        &self,
        session_id: SessionId,
        patch: SessionPatch,
    ) -> Result<(), ChannelError>;
}

//
// ─── IN-MEMORY CHANNEL ─────────────────────────────────────────────────────────
//

struct Subscriber {
    id: u64,
    tx: mpsc::UnboundedSender<SessionPatch>,
}

#[derive(Default)]
struct ChannelState {
    next_id: u64,
    topics: HashMap<SessionId, Vec<Subscriber>>,
}

/// Process-local channel, one unbounded queue per subscriber.
#[derive(Clone, Default)]
pub struct InMemorySyncChannel {
    state: Arc<Mutex<ChannelState>>,
    duplicate_delivery: bool,
}

impl InMemorySyncChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver every patch twice, to exercise at-least-once consumers.
    #[must_use]
    pub fn with_duplicate_delivery(mut self, duplicate: bool) -> Self {
        self.duplicate_delivery = duplicate;
        self
    }

    /// Number of live subscribers for a session.
    #[must_use]
    pub fn subscriber_count(&self, session_id: SessionId) -> usize {
        self.state
            .lock()
            .map(|guard| guard.topics.get(&session_id).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

fn remove_subscriber(state: &Weak<Mutex<ChannelState>>, session_id: SessionId, id: u64) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let Ok(mut guard) = state.lock() else {
        return;
    };
    if let Some(subscribers) = guard.topics.get_mut(&session_id) {
        subscribers.retain(|s| s.id != id);
        if subscribers.is_empty() {
            guard.topics.remove(&session_id);
        }
    }
}

#[async_trait]
impl SyncChannel for InMemorySyncChannel {
    async fn subscribe(&self, session_id: SessionId) -> Result<Subscription, ChannelError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|e| ChannelError::Connection(e.to_string()))?;
        let id = guard.next_id;
        guard.next_id += 1;

        let (tx, rx) = mpsc::unbounded_channel();
        guard
            .topics
            .entry(session_id)
            .or_default()
            .push(Subscriber { id, tx });
        debug!(%session_id, subscriber = id, "subscribed");

        let state = Arc::downgrade(&self.state);
        Ok(Subscription::new(session_id, rx, move || {
            remove_subscriber(&state, session_id, id);
        }))
    }

    async fn publish(
        &self,
        session_id: SessionId,
        patch: SessionPatch,
    ) -> Result<(), ChannelError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|e| ChannelError::Connection(e.to_string()))?;
        let Some(subscribers) = guard.topics.get_mut(&session_id) else {
            debug!(%session_id, "publish without subscribers");
            return Ok(());
        };

        let copies = if self.duplicate_delivery { 2 } else { 1 };
        subscribers.retain(|s| (0..copies).all(|_| s.tx.send(patch.clone()).is_ok()));
        debug!(%session_id, delivered = subscribers.len(), "published patch");
        Ok(())
    }
}
