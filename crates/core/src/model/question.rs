use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::archetype::Archetype;
use crate::model::ids::{AnswerId, QuestionId};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz has no questions")]
    Empty,

    #[error("question {question} has no answer options")]
    NoOptions { question: QuestionId },

    #[error("question {question} repeats answer id {answer}")]
    DuplicateAnswer {
        question: QuestionId,
        answer: AnswerId,
    },

    #[error("answer {answer} is not an option of question index {index}")]
    UnknownAnswer { index: usize, answer: AnswerId },
}

//
// ─── CONTENT ──────────────────────────────────────────────────────────────────
//

/// A selectable answer, tagged with the archetype it counts towards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: AnswerId,
    pub text: String,
    pub archetype: Archetype,
}

impl AnswerOption {
    #[must_use]
    pub fn new(id: AnswerId, text: impl Into<String>, archetype: Archetype) -> Self {
        Self {
            id,
            text: text.into(),
            archetype,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub prompt: String,
    pub options: Vec<AnswerOption>,
}

impl Question {
    #[must_use]
    pub fn new(id: QuestionId, prompt: impl Into<String>, options: Vec<AnswerOption>) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            options,
        }
    }

    #[must_use]
    pub fn option(&self, answer: AnswerId) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.id == answer)
    }
}

//
// ─── QUIZ ─────────────────────────────────────────────────────────────────────
//

/// Ordered, validated question set shared by both participants.
///
/// Index `i` of either participant's answer sequence refers to `questions[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    questions: Vec<Question>,
}

impl Quiz {
    /// Validate and wrap a question list.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Empty` without questions, `QuizError::NoOptions` for a
    /// question without options and `QuizError::DuplicateAnswer` when an answer id
    /// repeats within a question.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::Empty);
        }
        for question in &questions {
            if question.options.is_empty() {
                return Err(QuizError::NoOptions {
                    question: question.id,
                });
            }
            let mut seen = HashSet::with_capacity(question.options.len());
            for option in &question.options {
                if !seen.insert(option.id) {
                    return Err(QuizError::DuplicateAnswer {
                        question: question.id,
                        answer: option.id,
                    });
                }
            }
        }
        Ok(Self { questions })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Look up the option chosen at `index`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownAnswer` if the index is out of range or the
    /// answer does not belong to that question.
    pub fn option(&self, index: usize, answer: AnswerId) -> Result<&AnswerOption, QuizError> {
        self.questions
            .get(index)
            .and_then(|q| q.option(answer))
            .ok_or(QuizError::UnknownAnswer { index, answer })
    }

    /// Map an answer sequence to the archetypes it was tagged with.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownAnswer` for the first answer that does not
    /// resolve against its question.
    pub fn archetypes_for(&self, answers: &[AnswerId]) -> Result<Vec<Archetype>, QuizError> {
        answers
            .iter()
            .enumerate()
            .map(|(index, answer)| self.option(index, *answer).map(|o| o.archetype))
            .collect()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: u64, options: &[(u64, Archetype)]) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            options
                .iter()
                .map(|(a, arch)| AnswerOption::new(AnswerId::new(*a), format!("A{a}"), *arch))
                .collect(),
        )
    }

    #[test]
    fn empty_quiz_is_rejected() {
        assert_eq!(Quiz::new(Vec::new()).unwrap_err(), QuizError::Empty);
    }

    #[test]
    fn question_without_options_is_rejected() {
        let err = Quiz::new(vec![question(1, &[])]).unwrap_err();
        assert_eq!(
            err,
            QuizError::NoOptions {
                question: QuestionId::new(1)
            }
        );
    }

    #[test]
    fn duplicate_answer_ids_are_rejected() {
        let err = Quiz::new(vec![question(
            1,
            &[(10, Archetype::Guardian), (10, Archetype::Dreamer)],
        )])
        .unwrap_err();
        assert!(matches!(err, QuizError::DuplicateAnswer { .. }));
    }

    #[test]
    fn resolves_archetypes_per_index() {
        let quiz = Quiz::new(vec![
            question(1, &[(10, Archetype::Guardian), (11, Archetype::Hedonist)]),
            question(2, &[(20, Archetype::Strategist), (21, Archetype::Dreamer)]),
        ])
        .unwrap();

        let archetypes = quiz
            .archetypes_for(&[AnswerId::new(11), AnswerId::new(20)])
            .unwrap();
        assert_eq!(archetypes, vec![Archetype::Hedonist, Archetype::Strategist]);
    }

    #[test]
    fn answer_from_another_question_is_unknown() {
        let quiz = Quiz::new(vec![
            question(1, &[(10, Archetype::Guardian)]),
            question(2, &[(20, Archetype::Strategist)]),
        ])
        .unwrap();

        let err = quiz.archetypes_for(&[AnswerId::new(20)]).unwrap_err();
        assert_eq!(
            err,
            QuizError::UnknownAnswer {
                index: 0,
                answer: AnswerId::new(20)
            }
        );
    }
}
