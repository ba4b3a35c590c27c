//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{QuizError, SessionId};
use storage::channel::ChannelError;
use storage::repository::StorageError;

use crate::sessions::CoordinatorPhase;

/// Errors emitted by `SessionCoordinator`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoordinatorError {
    #[error("coordinator is busy ({0:?}); leave the current session first")]
    Busy(CoordinatorPhase),
    #[error("session {0} does not exist")]
    NotFound(SessionId),
    #[error("session is not playing yet")]
    NotPlaying,
    #[error("answer for question {got} arrived before question {expected}")]
    AnswerOutOfOrder { expected: usize, got: usize },
    #[error(transparent)]
    Store(#[from] StorageError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// Errors emitted by `QuizFlowController`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizFlowError {
    #[error("question {index} is already answered")]
    AlreadyAnswered { index: usize },
    #[error("quiz already finished")]
    Finished,
    #[error(transparent)]
    Quiz(#[from] QuizError),
}

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error("no quiz in progress")]
    NoActiveQuiz,
    #[error("no shared session")]
    NoSession,
    #[error("a shared session is active; leave it before starting solo")]
    SessionActive,
    #[error("waiting for the partner to join")]
    AwaitingPartner,
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
    #[error(transparent)]
    Flow(#[from] QuizFlowError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
}
