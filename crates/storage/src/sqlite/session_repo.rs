use chrono::{DateTime, Utc};
use quiz_core::model::{Session, SessionId, SessionPatch};
use tracing::debug;

use super::SqliteRepository;
use super::mapping::{answers_to_json, map_session_row, status_to_str};
use crate::repository::{SessionStore, StorageError};

const SELECT_SESSION: &str = r"
    SELECT id, status, answers_host, answers_guest, created_at
    FROM quiz_sessions
    WHERE id = ?1
";

fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl SessionStore for SqliteRepository {
    async fn create(&self, created_at: DateTime<Utc>) -> Result<Session, StorageError> {
        let session = Session::new(SessionId::generate(), created_at);

        let res = sqlx::query(
            r"
            INSERT INTO quiz_sessions (id, status, answers_host, answers_guest, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO NOTHING
            ",
        )
        .bind(session.id.to_string())
        .bind(status_to_str(session.status))
        .bind(answers_to_json(&session.answers_host)?)
        .bind(answers_to_json(&session.answers_guest)?)
        .bind(session.created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }
        debug!(session_id = %session.id, "session row inserted");
        Ok(session)
    }

    async fn get(&self, id: SessionId) -> Result<Session, StorageError> {
        let row = sqlx::query(SELECT_SESSION)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;
        map_session_row(&row)
    }

    async fn update(&self, id: SessionId, patch: &SessionPatch) -> Result<Session, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let row = sqlx::query(SELECT_SESSION)
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;
        let mut session = map_session_row(&row)?;

        let effect = session.apply(patch);
        if effect.is_noop() {
            tx.rollback().await.map_err(conn)?;
            return Ok(session);
        }

        sqlx::query(
            r"
            UPDATE quiz_sessions
            SET status = ?2, answers_host = ?3, answers_guest = ?4
            WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .bind(status_to_str(session.status))
        .bind(answers_to_json(&session.answers_host)?)
        .bind(answers_to_json(&session.answers_guest)?)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        tx.commit().await.map_err(conn)?;
        debug!(session_id = %id, ?effect, "session row updated");
        Ok(session)
    }
}
