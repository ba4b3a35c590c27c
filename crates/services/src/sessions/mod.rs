mod coordinator;
mod flow;
mod progress;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::{CoordinatorError, QuizFlowError, QuizServiceError};
pub use coordinator::{CoordinatorPhase, Delivery, JoinReport, RemoteUpdate, SessionCoordinator};
pub use flow::{FlowStep, QuizFlowController, QuizMode};
pub use progress::QuizProgress;
pub use workflow::{QuizOutcome, QuizService};

#[cfg(test)]
pub(crate) mod test_support;
