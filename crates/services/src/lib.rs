#![forbid(unsafe_code)]

pub mod error;
pub mod sessions;

pub use quiz_core::Clock;

pub use error::{CoordinatorError, QuizFlowError, QuizServiceError};
pub use sessions::{
    CoordinatorPhase, Delivery, FlowStep, JoinReport, QuizFlowController, QuizMode, QuizOutcome,
    QuizProgress, QuizService, RemoteUpdate, SessionCoordinator,
};
