mod archetype;
mod ids;
mod insight;
mod question;
mod session;

pub use archetype::{Archetype, ArchetypeError};
pub use ids::{AnswerId, ParseIdError, QuestionId, SessionId};
pub use insight::CoupleInsight;
pub use question::{AnswerOption, Question, Quiz, QuizError};
pub use session::{PatchEffect, Role, Session, SessionPatch, SessionStatus};
