use quiz_core::model::{AnswerId, AnswerOption, Archetype, Question, QuestionId, Quiz};

const LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

/// Four questions; option `k` of question `i` has id `i * 10 + k + 1` and
/// counts towards archetype letter `k` (A, B, C, D).
pub(crate) fn sample_quiz() -> Quiz {
    let questions = (0..4_u64)
        .map(|i| {
            let options = Archetype::ALL
                .into_iter()
                .zip(1_u64..)
                .map(|(archetype, k)| {
                    AnswerOption::new(AnswerId::new(i * 10 + k), archetype.title(), archetype)
                })
                .collect();
            Question::new(QuestionId::new(i + 1), format!("Question {}", i + 1), options)
        })
        .collect();
    Quiz::new(questions).unwrap()
}

/// Answer id for archetype `letter` on question `index` of [`sample_quiz`].
pub(crate) fn answer(index: usize, letter: char) -> AnswerId {
    let k = LETTERS.iter().position(|l| *l == letter).unwrap();
    AnswerId::new(u64::try_from(index * 10 + k + 1).unwrap())
}
