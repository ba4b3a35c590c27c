use std::sync::Arc;

use quiz_core::model::{AnswerId, Quiz};
use serde::Serialize;
use tracing::debug;

use super::progress::QuizProgress;
use crate::error::QuizFlowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    Solo,
    Multiplayer,
}

/// What a selection or a remote notification did to the question pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStep {
    /// Moved on; `index` is the new current question.
    Advanced { index: usize },
    /// Local answer recorded, partner still has to answer `index`.
    AwaitingPartner { index: usize },
    /// Both sequences are complete.
    Finished,
    Unchanged,
}

/// Walks the question list and decides when to advance.
///
/// Solo advances right after each selection. Multiplayer advances only once
/// both `local[index]` and `remote[index]` exist, and at most once per index.
#[derive(Debug, Clone)]
pub struct QuizFlowController {
    quiz: Arc<Quiz>,
    mode: QuizMode,
    index: usize,
    local: Vec<AnswerId>,
    remote: Vec<AnswerId>,
    advanced: bool,
    finished: bool,
}

impl QuizFlowController {
    #[must_use]
    pub fn new(quiz: Arc<Quiz>, mode: QuizMode) -> Self {
        Self {
            quiz,
            mode,
            index: 0,
            local: Vec::new(),
            remote: Vec::new(),
            advanced: false,
            finished: false,
        }
    }

    #[must_use]
    pub fn solo(quiz: Arc<Quiz>) -> Self {
        Self::new(quiz, QuizMode::Solo)
    }

    #[must_use]
    pub fn multiplayer(quiz: Arc<Quiz>) -> Self {
        Self::new(quiz, QuizMode::Multiplayer)
    }

    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    /// Index of the question currently shown.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn local_answers(&self) -> &[AnswerId] {
        &self.local
    }

    #[must_use]
    pub fn remote_answers(&self) -> &[AnswerId] {
        &self.remote
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Record the local answer for the current question.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError::Finished` after the last question,
    /// `AlreadyAnswered` when the current question already has a local answer,
    /// or `Quiz(UnknownAnswer)` if the answer is not an option of it.
    pub fn select(&mut self, answer: AnswerId) -> Result<FlowStep, QuizFlowError> {
        if self.finished {
            return Err(QuizFlowError::Finished);
        }
        if self.local.len() > self.index {
            return Err(QuizFlowError::AlreadyAnswered { index: self.index });
        }
        self.quiz.option(self.index, answer)?;

        self.local.push(answer);
        debug!(index = self.index, %answer, "answer selected");
        Ok(self.try_advance())
    }

    /// Take the partner's full answer sequence.
    ///
    /// Shorter sequences are stale and ignored; answers past the last question
    /// are dropped.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError::Quiz(UnknownAnswer)` if an entry is not an option
    /// of its question. The sequence is not taken and the pointer stays put.
    pub fn on_remote_answers(
        &mut self,
        answers: &[AnswerId],
    ) -> Result<FlowStep, QuizFlowError> {
        if self.mode == QuizMode::Solo {
            return Ok(FlowStep::Unchanged);
        }
        let answers = &answers[..answers.len().min(self.quiz.len())];
        if answers.len() <= self.remote.len() {
            return Ok(FlowStep::Unchanged);
        }
        for (index, answer) in answers.iter().enumerate() {
            self.quiz.option(index, *answer)?;
        }
        self.remote = answers.to_vec();
        Ok(self.try_advance())
    }

    fn has_remote(&self, index: usize) -> bool {
        self.mode == QuizMode::Solo || self.remote.len() > index
    }

    fn try_advance(&mut self) -> FlowStep {
        if self.finished {
            return FlowStep::Unchanged;
        }
        let index = self.index;
        if self.local.len() <= index {
            return FlowStep::Unchanged;
        }
        if !self.has_remote(index) {
            return FlowStep::AwaitingPartner { index };
        }
        if self.advanced {
            return FlowStep::Unchanged;
        }
        self.advanced = true;

        if index + 1 >= self.quiz.len() {
            self.finished = true;
            debug!(mode = ?self.mode, "quiz finished");
            return FlowStep::Finished;
        }
        self.index = index + 1;
        self.advanced = false;
        FlowStep::Advanced { index: self.index }
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        let partner_answered = match self.mode {
            QuizMode::Solo => None,
            QuizMode::Multiplayer => Some(self.remote.len()),
        };
        QuizProgress {
            total: self.quiz.len(),
            current: self.index,
            answered: self.local.len(),
            partner_answered,
            awaiting_partner: !self.finished
                && self.local.len() > self.index
                && !self.has_remote(self.index),
            is_finished: self.finished,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
