//! Built-in question set used by the command-line demos.

use quiz_core::model::{AnswerId, AnswerOption, Archetype, Question, QuestionId, Quiz, QuizError};

// (prompt, [guardian, strategist, hedonist, dreamer])
const QUESTIONS: [(&str, [&str; 4]); 8] = [
    (
        "You receive an unexpected bonus. What happens first?",
        [
            "It goes straight into the emergency fund.",
            "I put it into my index funds.",
            "Dinner out, then we'll see.",
            "It seeds the trip I keep talking about.",
        ],
    ),
    (
        "How do you feel about a monthly budget?",
        [
            "Essential, I track every category.",
            "Useful as long as it serves a long-term plan.",
            "Too restrictive; I know roughly where I stand.",
            "I mean to start one, someday.",
        ],
    ),
    (
        "A friend pitches a risky investment.",
        [
            "No thanks, I keep my savings safe.",
            "I'll read the numbers and maybe put in a small amount.",
            "Sounds fun, what's the minimum?",
            "I love the idea behind it, count me in.",
        ],
    ),
    (
        "What does retirement look like to you?",
        [
            "A paid-off home and no surprises.",
            "Financial independence, ideally early.",
            "Too far away to think about.",
            "A little house by the sea, somehow.",
        ],
    ),
    (
        "Your favourite kind of purchase is:",
        [
            "Insurance that covers everything.",
            "An asset that grows in value.",
            "An experience with friends.",
            "Something that moves a big dream forward.",
        ],
    ),
    (
        "When the bank statement arrives you:",
        [
            "Reconcile it line by line.",
            "Check it against my savings targets.",
            "Glance at the balance and move on.",
            "Leave it unopened for a while.",
        ],
    ),
    (
        "An expensive concert you love is in town.",
        [
            "Only if it fits this month's budget.",
            "I'd rather invest the money.",
            "Already bought the tickets.",
            "I'll go if it feels like a once-in-a-lifetime moment.",
        ],
    ),
    (
        "Money is mostly a tool for...",
        [
            "Security.",
            "Growth.",
            "Enjoyment.",
            "Freedom to chase ideas.",
        ],
    ),
];

/// The demo quiz. Option `k` of question `i` has id `i * 10 + k + 1`.
///
/// # Errors
///
/// Returns `QuizError` if the built-in content fails validation.
pub fn demo_quiz() -> Result<Quiz, QuizError> {
    let questions = QUESTIONS
        .iter()
        .zip(1_u64..)
        .map(|((prompt, texts), number)| {
            let options = Archetype::ALL
                .into_iter()
                .zip(texts.iter())
                .zip(1_u64..)
                .map(|((archetype, text), k)| {
                    AnswerOption::new(AnswerId::new((number - 1) * 10 + k), *text, archetype)
                })
                .collect();
            Question::new(QuestionId::new(number), *prompt, options)
        })
        .collect();
    Quiz::new(questions)
}
