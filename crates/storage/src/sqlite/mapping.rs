use quiz_core::model::{AnswerId, Session, SessionId, SessionStatus};
use sqlx::Row;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn status_to_str(status: SessionStatus) -> &'static str {
    status.as_str()
}

pub(crate) fn parse_status(s: &str) -> Result<SessionStatus, StorageError> {
    match s {
        "waiting" => Ok(SessionStatus::Waiting),
        "playing" => Ok(SessionStatus::Playing),
        _ => Err(StorageError::Serialization(format!("invalid status: {s}"))),
    }
}

/// Answer slots are stored as JSON arrays of ids.
pub(crate) fn answers_to_json(answers: &[AnswerId]) -> Result<String, StorageError> {
    serde_json::to_string(answers).map_err(ser)
}

pub(crate) fn answers_from_json(raw: &str) -> Result<Vec<AnswerId>, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn map_session_row(row: &sqlx::sqlite::SqliteRow) -> Result<Session, StorageError> {
    let id: SessionId = row
        .try_get::<String, _>("id")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let status = parse_status(row.try_get::<String, _>("status").map_err(ser)?.as_str())?;
    let answers_host = answers_from_json(&row.try_get::<String, _>("answers_host").map_err(ser)?)?;
    let answers_guest =
        answers_from_json(&row.try_get::<String, _>("answers_guest").map_err(ser)?)?;

    Ok(Session {
        id,
        status,
        answers_host,
        answers_guest,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}
