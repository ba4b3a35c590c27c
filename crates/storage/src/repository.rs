use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{Session, SessionId, SessionPatch};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::channel::{InMemorySyncChannel, SyncChannel};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable store for shared session records.
///
/// Implementations apply patches with `Session::apply`, so status never
/// regresses and answer slots only grow.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Allocate a new record in `Waiting` state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn create(&self, created_at: DateTime<Utc>) -> Result<Session, StorageError>;

    /// Fetch a record by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get(&self, id: SessionId) -> Result<Session, StorageError>;

    /// Merge a patch into a record and return the stored result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn update(&self, id: SessionId, patch: &SessionPatch) -> Result<Session, StorageError>;
}

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<SessionId, Session>>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, created_at: DateTime<Utc>) -> Result<Session, StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut id = SessionId::generate();
        while guard.contains_key(&id) {
            id = SessionId::generate();
        }
        let session = Session::new(id, created_at);
        guard.insert(id, session.clone());
        Ok(session)
    }

    async fn get(&self, id: SessionId) -> Result<Session, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn update(&self, id: SessionId, patch: &SessionPatch) -> Result<Session, StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let session = guard.get_mut(&id).ok_or(StorageError::NotFound)?;
        session.apply(patch);
        Ok(session.clone())
    }
}

/// Aggregates the session store and sync channel behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionStore>,
    pub channel: Arc<dyn SyncChannel>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        let channel: Arc<dyn SyncChannel> = Arc::new(InMemorySyncChannel::new());
        Self { sessions, channel }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{AnswerId, Role, SessionStatus};
    use quiz_core::time::fixed_now;

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = InMemorySessionStore::new();
        let created = store.create(fixed_now()).await.unwrap();
        assert_eq!(created.status, SessionStatus::Waiting);

        let fetched = store.get(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn missing_session_is_not_found() {
        let store = InMemorySessionStore::new();
        let err = store.get(SessionId::generate()).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));

        let err = store
            .update(SessionId::generate(), &SessionPatch::status(SessionStatus::Playing))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn update_merges_patch() {
        let store = InMemorySessionStore::new();
        let created = store.create(fixed_now()).await.unwrap();

        store
            .update(created.id, &SessionPatch::status(SessionStatus::Playing))
            .await
            .unwrap();
        let updated = store
            .update(
                created.id,
                &SessionPatch::answers(Role::Host, vec![AnswerId::new(1)]),
            )
            .await
            .unwrap();

        assert_eq!(updated.status, SessionStatus::Playing);
        assert_eq!(updated.answers_host, vec![AnswerId::new(1)]);
        assert!(updated.answers_guest.is_empty());
    }
}
