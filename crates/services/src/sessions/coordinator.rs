use std::sync::Arc;

use quiz_core::model::{AnswerId, Role, Session, SessionId, SessionPatch, SessionStatus};
use storage::channel::{Subscription, SyncChannel};
use storage::repository::{SessionStore, Storage, StorageError};
use tracing::{debug, info, warn};

use crate::Clock;
use crate::error::CoordinatorError;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Local lifecycle of one client's view of a shared session.
///
/// `Idle → Creating → Waiting → Playing` for the host,
/// `Idle → Joining → Ready → Playing` for the guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinatorPhase {
    #[default]
    Idle,
    Creating,
    Joining,
    Waiting,
    Ready,
    Playing,
}

/// Outcome of a successful join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinReport {
    pub session_id: SessionId,
    /// The record was already `Playing`, so another guest got there first.
    pub already_started: bool,
}

/// What a remote patch changed locally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoteUpdate {
    pub became_playing: bool,
    pub partner_answers_changed: bool,
}

impl RemoteUpdate {
    #[must_use]
    pub fn merge(self, other: RemoteUpdate) -> RemoteUpdate {
        RemoteUpdate {
            became_playing: self.became_playing || other.became_playing,
            partner_answers_changed: self.partner_answers_changed || other.partner_answers_changed,
        }
    }

    #[must_use]
    pub fn is_noop(&self) -> bool {
        !(self.became_playing || self.partner_answers_changed)
    }
}

/// Whether the local answer sequence reached the store and channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Published,
    /// The write failed; the sequence is republished on the next mutation.
    Deferred,
}

//
// ─── COORDINATOR ───────────────────────────────────────────────────────────────
//

/// Owns one client's participation in a shared session.
///
/// All state lives in plain fields mutated through `&mut self`; remote patches
/// are applied synchronously by [`SessionCoordinator::on_remote_update`], so the
/// transition to `Playing` is decided in one place and happens once.
pub struct SessionCoordinator {
    store: Arc<dyn SessionStore>,
    channel: Arc<dyn SyncChannel>,
    clock: Clock,
    phase: CoordinatorPhase,
    role: Option<Role>,
    mirror: Option<Session>,
    last_applied_status: Option<SessionStatus>,
    local_answers: Vec<AnswerId>,
    subscription: Option<Subscription>,
    publish_pending: bool,
}

impl SessionCoordinator {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, channel: Arc<dyn SyncChannel>) -> Self {
        Self {
            store,
            channel,
            clock: Clock::system(),
            phase: CoordinatorPhase::Idle,
            role: None,
            mirror: None,
            last_applied_status: None,
            local_answers: Vec::new(),
            subscription: None,
            publish_pending: false,
        }
    }

    #[must_use]
    pub fn from_storage(storage: &Storage) -> Self {
        Self::new(Arc::clone(&storage.sessions), Arc::clone(&storage.channel))
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn phase(&self) -> CoordinatorPhase {
        self.phase
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.mirror.as_ref().map(|s| s.id)
    }

    /// Local copy of the shared record, as far as this client has seen it.
    #[must_use]
    pub fn mirror(&self) -> Option<&Session> {
        self.mirror.as_ref()
    }

    #[must_use]
    pub fn local_answers(&self) -> &[AnswerId] {
        &self.local_answers
    }

    /// Partner answers received so far; empty before a role is assigned.
    #[must_use]
    pub fn remote_answers(&self) -> &[AnswerId] {
        match (self.mirror.as_ref(), self.role) {
            (Some(mirror), Some(role)) => mirror.answers_for(role.partner()),
            _ => &[],
        }
    }

    #[must_use]
    pub fn is_publish_pending(&self) -> bool {
        self.publish_pending
    }

    /// Create a session as host and wait for a guest.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::Busy` unless idle, or the store/channel error.
    /// On failure the coordinator is back in `Idle` and may retry.
    pub async fn create(&mut self) -> Result<SessionId, CoordinatorError> {
        self.ensure_idle()?;
        self.phase = CoordinatorPhase::Creating;

        let result = self.try_create().await;
        if result.is_err() {
            self.reset();
        }
        result
    }

    async fn try_create(&mut self) -> Result<SessionId, CoordinatorError> {
        let session = self.store.create(self.clock.now()).await?;
        let session_id = session.id;
        let subscription = self.channel.subscribe(session_id).await?;

        self.role = Some(Role::Host);
        self.last_applied_status = Some(session.status);
        self.mirror = Some(session);
        self.subscription = Some(subscription);
        self.phase = CoordinatorPhase::Waiting;
        info!(%session_id, role = %Role::Host, "session created, waiting for guest");
        Ok(session_id)
    }

    /// Join an existing session as guest and start playing.
    ///
    /// Writes `status = Playing` to the store, publishes the same patch and
    /// moves to `Playing` without waiting for the echo.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::NotFound` for an unknown id, `Busy` unless
    /// idle, or the store/channel error. On failure the coordinator is back in
    /// `Idle` and may retry.
    pub async fn join(&mut self, session_id: SessionId) -> Result<JoinReport, CoordinatorError> {
        self.ensure_idle()?;
        self.phase = CoordinatorPhase::Joining;

        let result = self.try_join(session_id).await;
        if result.is_err() {
            self.reset();
        }
        result
    }

    async fn try_join(&mut self, session_id: SessionId) -> Result<JoinReport, CoordinatorError> {
        let session = match self.store.get(session_id).await {
            Ok(session) => session,
            Err(StorageError::NotFound) => {
                warn!(%session_id, "join failed: no such session");
                return Err(CoordinatorError::NotFound(session_id));
            }
            Err(err) => return Err(err.into()),
        };

        let already_started = session.status == SessionStatus::Playing;
        if already_started {
            warn!(%session_id, "joining a session that is already playing");
        }

        self.subscription = Some(self.channel.subscribe(session_id).await?);
        self.role = Some(Role::Guest);
        self.last_applied_status = Some(session.status);
        self.mirror = Some(session);
        self.phase = CoordinatorPhase::Ready;

        let patch = SessionPatch::status(SessionStatus::Playing);
        self.store.update(session_id, &patch).await?;
        self.channel.publish(session_id, patch.clone()).await?;

        if let Some(mirror) = self.mirror.as_mut() {
            mirror.apply(&patch);
        }
        self.last_applied_status = Some(SessionStatus::Playing);
        self.phase = CoordinatorPhase::Playing;
        info!(%session_id, role = %Role::Guest, already_started, "joined session");

        Ok(JoinReport {
            session_id,
            already_started,
        })
    }

    /// Apply a patch pushed by the channel.
    ///
    /// Data for this client's own slot is ignored. Duplicates are harmless: the
    /// move to `Playing` is reported at most once.
    pub fn on_remote_update(&mut self, patch: &SessionPatch) -> RemoteUpdate {
        let (Some(role), Some(mirror)) = (self.role, self.mirror.as_mut()) else {
            debug!("ignoring patch while idle");
            return RemoteUpdate::default();
        };

        let mut incoming = patch.clone();
        match role {
            Role::Host => incoming.answers_host = None,
            Role::Guest => incoming.answers_guest = None,
        }
        let effect = mirror.apply(&incoming);
        let session_id = mirror.id;

        let mut update = RemoteUpdate {
            became_playing: false,
            partner_answers_changed: effect.answers_changed(role.partner()),
        };

        if incoming.status == Some(SessionStatus::Playing)
            && self.last_applied_status != Some(SessionStatus::Playing)
        {
            self.last_applied_status = Some(SessionStatus::Playing);
            self.phase = CoordinatorPhase::Playing;
            update.became_playing = true;
            info!(%session_id, %role, "partner joined, playing");
        }

        if update.partner_answers_changed {
            debug!(
                %session_id,
                %role,
                partner_answers = self.remote_answers().len(),
                "partner answers updated"
            );
        }
        update
    }

    /// Wait for the next pushed patch and apply it.
    ///
    /// Returns `None` when there is no subscription or the channel is gone.
    pub async fn next_update(&mut self) -> Option<RemoteUpdate> {
        let patch = self.subscription.as_mut()?.recv().await?;
        Some(self.on_remote_update(&patch))
    }

    /// Apply every patch already delivered, without waiting.
    pub fn drain_updates(&mut self) -> RemoteUpdate {
        let mut combined = RemoteUpdate::default();
        while let Some(patch) = self.subscription.as_mut().and_then(Subscription::try_recv) {
            combined = combined.merge(self.on_remote_update(&patch));
        }
        combined
    }

    /// Check that an answer for question `index` would be accepted by
    /// [`SessionCoordinator::publish_local_answer`], without changing anything.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::NotPlaying` before the session started, or
    /// `AnswerOutOfOrder` unless `index` is the next unanswered question.
    pub fn ensure_can_publish(&self, index: usize) -> Result<(), CoordinatorError> {
        if self.phase != CoordinatorPhase::Playing {
            return Err(CoordinatorError::NotPlaying);
        }
        let expected = self.local_answers.len();
        if index != expected {
            return Err(CoordinatorError::AnswerOutOfOrder {
                expected,
                got: index,
            });
        }
        Ok(())
    }

    /// Append the local answer for question `index` and publish the whole
    /// sequence under this client's slot.
    ///
    /// A failed write is logged and remembered; the next mutation (or
    /// [`SessionCoordinator::republish`]) sends the full state again.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::NotPlaying` before the session started, or
    /// `AnswerOutOfOrder` unless `index` is the next unanswered question.
    pub async fn publish_local_answer(
        &mut self,
        index: usize,
        answer: AnswerId,
    ) -> Result<Delivery, CoordinatorError> {
        self.ensure_can_publish(index)?;
        self.local_answers.push(answer);
        Ok(self.publish_local().await)
    }

    /// Publish the current local sequence again.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::NotPlaying` before the session started.
    pub async fn republish(&mut self) -> Result<Delivery, CoordinatorError> {
        if self.phase != CoordinatorPhase::Playing {
            return Err(CoordinatorError::NotPlaying);
        }
        Ok(self.publish_local().await)
    }

    async fn publish_local(&mut self) -> Delivery {
        let (Some(role), Some(session_id)) = (self.role, self.session_id()) else {
            return Delivery::Deferred;
        };
        let patch = SessionPatch::answers(role, self.local_answers.clone());
        if let Some(mirror) = self.mirror.as_mut() {
            mirror.apply(&patch);
        }

        match self.write_and_publish(session_id, patch).await {
            Ok(()) => {
                self.publish_pending = false;
                debug!(%session_id, %role, answers = self.local_answers.len(), "answers published");
                Delivery::Published
            }
            Err(err) => {
                self.publish_pending = true;
                warn!(
                    %session_id,
                    %role,
                    answers = self.local_answers.len(),
                    error = %err,
                    "publishing answers failed; will resend with the next change"
                );
                Delivery::Deferred
            }
        }
    }

    async fn write_and_publish(
        &self,
        session_id: SessionId,
        patch: SessionPatch,
    ) -> Result<(), CoordinatorError> {
        self.store.update(session_id, &patch).await?;
        self.channel.publish(session_id, patch).await?;
        Ok(())
    }

    /// Fetch the stored record and apply it as if it had been pushed.
    ///
    /// Recovers notifications that were missed, for example while the
    /// subscription was being set up.
    ///
    /// # Errors
    ///
    /// Returns the store error; local state is left untouched in that case.
    pub async fn resync(&mut self) -> Result<RemoteUpdate, CoordinatorError> {
        let Some(session_id) = self.session_id() else {
            return Ok(RemoteUpdate::default());
        };
        let stored = self.store.get(session_id).await?;
        let patch = SessionPatch {
            status: Some(stored.status),
            answers_host: Some(stored.answers_host),
            answers_guest: Some(stored.answers_guest),
        };
        Ok(self.on_remote_update(&patch))
    }

    /// Unsubscribe and drop all session state.
    pub fn leave(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        if let Some(session_id) = self.session_id() {
            info!(%session_id, "left session");
        }
        self.reset();
    }

    fn ensure_idle(&self) -> Result<(), CoordinatorError> {
        if self.phase == CoordinatorPhase::Idle {
            Ok(())
        } else {
            Err(CoordinatorError::Busy(self.phase))
        }
    }

    fn reset(&mut self) {
        self.subscription = None;
        self.phase = CoordinatorPhase::Idle;
        self.role = None;
        self.mirror = None;
        self.last_applied_status = None;
        self.local_answers.clear();
        self.publish_pending = false;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use quiz_core::time::{fixed_clock, fixed_now};
    use std::sync::atomic::{AtomicBool, Ordering};
    use storage::channel::InMemorySyncChannel;
    use storage::repository::InMemorySessionStore;

    fn ids(raw: &[u64]) -> Vec<AnswerId> {
        raw.iter().copied().map(AnswerId::new).collect()
    }

    fn coordinator(storage: &Storage) -> SessionCoordinator {
        SessionCoordinator::from_storage(storage).with_clock(fixed_clock())
    }

    /// Store that can be switched into failing mode.
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemorySessionStore,
        fail_create: AtomicBool,
        fail_update: AtomicBool,
    }

    #[async_trait]
    impl SessionStore for FlakyStore {
        async fn create(&self, created_at: DateTime<Utc>) -> Result<Session, StorageError> {
            if self.fail_create.load(Ordering::SeqCst) {
                return Err(StorageError::Connection("offline".into()));
            }
            self.inner.create(created_at).await
        }

        async fn get(&self, id: SessionId) -> Result<Session, StorageError> {
            self.inner.get(id).await
        }

        async fn update(
            &self,
            id: SessionId,
            patch: &SessionPatch,
        ) -> Result<Session, StorageError> {
            if self.fail_update.load(Ordering::SeqCst) {
                return Err(StorageError::Connection("offline".into()));
            }
            self.inner.update(id, patch).await
        }
    }

    fn flaky_storage() -> (Arc<FlakyStore>, Storage) {
        let store = Arc::new(FlakyStore::default());
        let sessions: Arc<dyn SessionStore> = store.clone();
        let channel: Arc<dyn SyncChannel> = Arc::new(InMemorySyncChannel::new());
        (store, Storage { sessions, channel })
    }

    async fn playing_pair(storage: &Storage) -> (SessionCoordinator, SessionCoordinator) {
        let mut host = coordinator(storage);
        let mut guest = coordinator(storage);
        let id = host.create().await.unwrap();
        guest.join(id).await.unwrap();
        host.drain_updates();
        guest.drain_updates();
        (host, guest)
    }

    #[tokio::test]
    async fn host_create_waits_for_guest() {
        let storage = Storage::in_memory();
        let mut host = coordinator(&storage);

        let id = host.create().await.unwrap();

        assert_eq!(host.phase(), CoordinatorPhase::Waiting);
        assert_eq!(host.role(), Some(Role::Host));
        assert_eq!(host.session_id(), Some(id));
        let stored = storage.sessions.get(id).await.unwrap();
        assert_eq!(stored.status, SessionStatus::Waiting);
        assert_eq!(stored.created_at, fixed_now());
        assert_eq!(host.mirror().map(|s| s.created_at), Some(fixed_now()));
    }

    #[tokio::test]
    async fn guest_join_starts_playing_and_host_follows() {
        let storage = Storage::in_memory();
        let mut host = coordinator(&storage);
        let mut guest = coordinator(&storage);
        let id = host.create().await.unwrap();

        let report = guest.join(id).await.unwrap();
        assert_eq!(report.session_id, id);
        assert!(!report.already_started);
        assert_eq!(guest.phase(), CoordinatorPhase::Playing);
        assert_eq!(guest.role(), Some(Role::Guest));

        let update = host.next_update().await.unwrap();
        assert!(update.became_playing);
        assert_eq!(host.phase(), CoordinatorPhase::Playing);

        // the guest's own echo does not trigger a second transition
        assert!(guest.drain_updates().is_noop());
        assert_eq!(
            storage.sessions.get(id).await.unwrap().status,
            SessionStatus::Playing
        );
    }

    #[tokio::test]
    async fn joining_unknown_session_resets_and_allows_retry() {
        let storage = Storage::in_memory();
        let mut host = coordinator(&storage);
        let mut guest = coordinator(&storage);
        let id = host.create().await.unwrap();

        let missing = SessionId::generate();
        let err = guest.join(missing).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::NotFound(got) if got == missing));
        assert_eq!(guest.phase(), CoordinatorPhase::Idle);
        assert_eq!(guest.role(), None);

        guest.join(id).await.unwrap();
        assert_eq!(guest.phase(), CoordinatorPhase::Playing);
    }

    #[tokio::test]
    async fn duplicate_playing_is_applied_once() {
        let channel: Arc<dyn SyncChannel> =
            Arc::new(InMemorySyncChannel::new().with_duplicate_delivery(true));
        let storage = Storage {
            sessions: Arc::new(InMemorySessionStore::new()),
            channel,
        };
        let mut host = coordinator(&storage);
        let mut guest = coordinator(&storage);
        let id = host.create().await.unwrap();
        guest.join(id).await.unwrap();

        let playing = SessionPatch::status(SessionStatus::Playing);
        let mut transitions = 0;
        for update in [
            host.next_update().await.unwrap(),
            host.next_update().await.unwrap(),
            host.on_remote_update(&playing),
        ] {
            if update.became_playing {
                transitions += 1;
            }
        }
        assert_eq!(transitions, 1);
        assert_eq!(host.phase(), CoordinatorPhase::Playing);
    }

    #[tokio::test]
    async fn second_guest_is_flagged() {
        let storage = Storage::in_memory();
        let mut host = coordinator(&storage);
        let id = host.create().await.unwrap();

        coordinator(&storage).join(id).await.unwrap();
        let report = coordinator(&storage).join(id).await.unwrap();
        assert!(report.already_started);
    }

    #[tokio::test]
    async fn busy_coordinator_rejects_create_and_join() {
        let storage = Storage::in_memory();
        let mut host = coordinator(&storage);
        let id = host.create().await.unwrap();

        assert!(matches!(
            host.create().await,
            Err(CoordinatorError::Busy(CoordinatorPhase::Waiting))
        ));
        assert!(matches!(
            host.join(id).await,
            Err(CoordinatorError::Busy(CoordinatorPhase::Waiting))
        ));
        assert_eq!(host.phase(), CoordinatorPhase::Waiting);
    }

    #[tokio::test]
    async fn answers_flow_to_partner_slot() {
        let storage = Storage::in_memory();
        let (mut host, mut guest) = playing_pair(&storage).await;

        let delivery = host.publish_local_answer(0, AnswerId::new(11)).await.unwrap();
        assert_eq!(delivery, Delivery::Published);

        let update = guest.drain_updates();
        assert!(update.partner_answers_changed);
        assert_eq!(guest.remote_answers(), ids(&[11]).as_slice());
        // the host's own echo is not a partner change
        assert!(!host.drain_updates().partner_answers_changed);
        assert!(host.remote_answers().is_empty());
    }

    #[tokio::test]
    async fn remote_data_for_own_slot_is_ignored() {
        let storage = Storage::in_memory();
        let (mut host, _guest) = playing_pair(&storage).await;
        host.publish_local_answer(0, AnswerId::new(1)).await.unwrap();

        let update = host.on_remote_update(&SessionPatch::answers(Role::Host, ids(&[9, 9, 9])));
        assert!(update.is_noop());
        assert_eq!(host.local_answers(), ids(&[1]).as_slice());
        assert_eq!(host.mirror().unwrap().answers_host, ids(&[1]));
    }

    #[tokio::test]
    async fn stale_partner_sequence_is_dropped() {
        let storage = Storage::in_memory();
        let (mut host, _guest) = playing_pair(&storage).await;

        host.on_remote_update(&SessionPatch::answers(Role::Guest, ids(&[1, 2])));
        let update = host.on_remote_update(&SessionPatch::answers(Role::Guest, ids(&[1])));
        assert!(!update.partner_answers_changed);
        assert_eq!(host.remote_answers(), ids(&[1, 2]).as_slice());
    }

    #[tokio::test]
    async fn publishing_requires_playing_and_order() {
        let storage = Storage::in_memory();
        let mut host = coordinator(&storage);
        host.create().await.unwrap();
        assert!(matches!(
            host.publish_local_answer(0, AnswerId::new(1)).await,
            Err(CoordinatorError::NotPlaying)
        ));

        let (mut host, _guest) = playing_pair(&storage).await;
        let err = host
            .publish_local_answer(1, AnswerId::new(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoordinatorError::AnswerOutOfOrder {
                expected: 0,
                got: 1
            }
        ));
        assert!(host.local_answers().is_empty());
    }

    #[tokio::test]
    async fn publish_precondition_check_leaves_state_alone() {
        let storage = Storage::in_memory();
        let mut host = coordinator(&storage);
        assert!(matches!(
            host.ensure_can_publish(0),
            Err(CoordinatorError::NotPlaying)
        ));

        let (mut host, _guest) = playing_pair(&storage).await;
        host.ensure_can_publish(0).unwrap();
        assert!(host.local_answers().is_empty());

        host.publish_local_answer(0, AnswerId::new(1)).await.unwrap();
        assert!(matches!(
            host.ensure_can_publish(0),
            Err(CoordinatorError::AnswerOutOfOrder {
                expected: 1,
                got: 0
            })
        ));
        host.ensure_can_publish(1).unwrap();
        assert_eq!(host.local_answers(), ids(&[1]).as_slice());
    }

    #[tokio::test]
    async fn publish_failure_is_transient() {
        let (store, storage) = flaky_storage();
        let (mut host, mut guest) = playing_pair(&storage).await;
        let id = host.session_id().unwrap();

        store.fail_update.store(true, Ordering::SeqCst);
        let delivery = host.publish_local_answer(0, AnswerId::new(1)).await.unwrap();
        assert_eq!(delivery, Delivery::Deferred);
        assert!(host.is_publish_pending());
        assert_eq!(host.local_answers(), ids(&[1]).as_slice());
        assert!(guest.drain_updates().is_noop());

        store.fail_update.store(false, Ordering::SeqCst);
        let delivery = host.publish_local_answer(1, AnswerId::new(2)).await.unwrap();
        assert_eq!(delivery, Delivery::Published);
        assert!(!host.is_publish_pending());

        guest.drain_updates();
        assert_eq!(guest.remote_answers(), ids(&[1, 2]).as_slice());
        assert_eq!(
            storage.sessions.get(id).await.unwrap().answers_host,
            ids(&[1, 2])
        );
    }

    #[tokio::test]
    async fn republish_retries_pending_state() {
        let (store, storage) = flaky_storage();
        let (mut host, _guest) = playing_pair(&storage).await;
        let id = host.session_id().unwrap();

        store.fail_update.store(true, Ordering::SeqCst);
        host.publish_local_answer(0, AnswerId::new(5)).await.unwrap();
        store.fail_update.store(false, Ordering::SeqCst);

        assert_eq!(host.republish().await.unwrap(), Delivery::Published);
        assert_eq!(
            storage.sessions.get(id).await.unwrap().answers_host,
            ids(&[5])
        );
    }

    #[tokio::test]
    async fn create_failure_returns_to_idle() {
        let (store, storage) = flaky_storage();
        let mut host = coordinator(&storage);

        store.fail_create.store(true, Ordering::SeqCst);
        let err = host.create().await.unwrap_err();
        assert!(matches!(err, CoordinatorError::Store(_)));
        assert_eq!(host.phase(), CoordinatorPhase::Idle);

        store.fail_create.store(false, Ordering::SeqCst);
        host.create().await.unwrap();
        assert_eq!(host.phase(), CoordinatorPhase::Waiting);
    }

    #[tokio::test]
    async fn join_write_failure_surfaces_and_resets() {
        let (store, storage) = flaky_storage();
        let mut host = coordinator(&storage);
        let id = host.create().await.unwrap();

        store.fail_update.store(true, Ordering::SeqCst);
        let mut guest = coordinator(&storage);
        assert!(matches!(
            guest.join(id).await,
            Err(CoordinatorError::Store(_))
        ));
        assert_eq!(guest.phase(), CoordinatorPhase::Idle);
        assert!(guest.session_id().is_none());
    }

    #[tokio::test]
    async fn resync_recovers_missed_notifications() {
        let storage = Storage::in_memory();
        let mut host = coordinator(&storage);
        let id = host.create().await.unwrap();

        // a guest write that never reached the channel
        storage
            .sessions
            .update(id, &SessionPatch::status(SessionStatus::Playing))
            .await
            .unwrap();
        storage
            .sessions
            .update(id, &SessionPatch::answers(Role::Guest, ids(&[3])))
            .await
            .unwrap();

        let update = host.resync().await.unwrap();
        assert!(update.became_playing);
        assert!(update.partner_answers_changed);
        assert_eq!(host.remote_answers(), ids(&[3]).as_slice());
    }

    #[tokio::test]
    async fn leave_unsubscribes_and_ignores_later_patches() {
        let channel = Arc::new(InMemorySyncChannel::new());
        let storage = Storage {
            sessions: Arc::new(InMemorySessionStore::new()),
            channel: channel.clone(),
        };
        let mut host = coordinator(&storage);
        let id = host.create().await.unwrap();
        assert_eq!(channel.subscriber_count(id), 1);

        host.leave();
        assert_eq!(channel.subscriber_count(id), 0);
        assert_eq!(host.phase(), CoordinatorPhase::Idle);
        assert!(
            host.on_remote_update(&SessionPatch::status(SessionStatus::Playing))
                .is_noop()
        );
        assert!(host.next_update().await.is_none());
    }
}
