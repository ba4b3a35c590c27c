use thiserror::Error;

use crate::model::{ArchetypeError, ParseIdError, QuizError};
use crate::share_link::ShareLinkError;

/// Aggregate of the domain errors raised at the boundaries that build quiz data.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Archetype(#[from] ArchetypeError),
    #[error(transparent)]
    ShareLink(#[from] ShareLinkError),
    #[error(transparent)]
    ParseId(#[from] ParseIdError),
}
