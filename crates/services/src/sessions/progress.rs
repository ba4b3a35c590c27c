/// Aggregated view of quiz progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizProgress {
    pub total: usize,
    pub current: usize,
    pub answered: usize,
    /// Partner answers seen so far; `None` when playing solo.
    pub partner_answered: Option<usize>,
    pub awaiting_partner: bool,
    pub is_finished: bool,
}
