use std::fmt;
use std::sync::Arc;

use quiz_core::compatibility;
use quiz_core::model::{AnswerId, CoupleInsight, Quiz, QuizError, Role, SessionId};
use quiz_core::scoring::{self, QuizResult};
use quiz_core::share_link::ShareLink;
use serde::Serialize;
use storage::repository::Storage;
use tracing::{info, warn};
use url::Url;

use super::coordinator::{CoordinatorPhase, JoinReport, RemoteUpdate, SessionCoordinator};
use super::flow::{FlowStep, QuizFlowController, QuizMode};
use super::progress::QuizProgress;
use crate::Clock;
use crate::error::QuizServiceError;

/// Final result handed to result listeners.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizOutcome {
    pub mode: QuizMode,
    /// Role played in a shared session; `None` for solo.
    pub role: Option<Role>,
    pub own: QuizResult,
    pub partner: Option<QuizResult>,
    /// Computed from (host, guest) so both clients see the same entry.
    pub insight: Option<&'static CoupleInsight>,
}

type ResultListener = Box<dyn FnMut(&QuizOutcome) + Send>;

/// Facade the UI drives: starts solo or shared quizzes, takes answers and
/// reports the outcome.
pub struct QuizService {
    quiz: Arc<Quiz>,
    coordinator: SessionCoordinator,
    flow: Option<QuizFlowController>,
    outcome: Option<QuizOutcome>,
    listeners: Vec<ResultListener>,
}

impl QuizService {
    #[must_use]
    pub fn new(quiz: Arc<Quiz>, storage: &Storage) -> Self {
        Self {
            quiz,
            coordinator: SessionCoordinator::from_storage(storage),
            flow: None,
            outcome: None,
            listeners: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.coordinator = self.coordinator.with_clock(clock);
        self
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn phase(&self) -> CoordinatorPhase {
        self.coordinator.phase()
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.coordinator.role()
    }

    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.coordinator.session_id()
    }

    #[must_use]
    pub fn coordinator(&self) -> &SessionCoordinator {
        &self.coordinator
    }

    #[must_use]
    pub fn progress(&self) -> Option<QuizProgress> {
        self.flow.as_ref().map(QuizFlowController::progress)
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&QuizOutcome> {
        self.outcome.as_ref()
    }

    /// Start a local quiz with no partner.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::SessionActive` while a shared session is open.
    pub fn start_solo(&mut self) -> Result<(), QuizServiceError> {
        if self.coordinator.phase() != CoordinatorPhase::Idle {
            return Err(QuizServiceError::SessionActive);
        }
        self.outcome = None;
        self.flow = Some(QuizFlowController::solo(Arc::clone(&self.quiz)));
        info!(questions = self.quiz.len(), "solo quiz started");
        Ok(())
    }

    /// Create a shared session. Questions unlock once the guest joins.
    ///
    /// # Errors
    ///
    /// Returns the coordinator error. A running quiz is left untouched.
    pub async fn start_multiplayer_as_host(&mut self) -> Result<SessionId, QuizServiceError> {
        let session_id = self.coordinator.create().await?;
        self.flow = None;
        self.outcome = None;
        Ok(session_id)
    }

    /// Link the host sends to the partner.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::NoSession` if no shared session is open.
    pub fn share_link(&self, base_url: &Url) -> Result<ShareLink, QuizServiceError> {
        let session_id = self
            .coordinator
            .session_id()
            .ok_or(QuizServiceError::NoSession)?;
        Ok(ShareLink::new(base_url, session_id))
    }

    /// Join the host's session; the quiz starts immediately.
    ///
    /// # Errors
    ///
    /// Returns the coordinator error, e.g. `NotFound` for an unknown id, and
    /// leaves any running quiz untouched. After `NotFound` the join may be
    /// retried.
    pub async fn join_multiplayer_as_guest(
        &mut self,
        session_id: SessionId,
    ) -> Result<JoinReport, QuizServiceError> {
        let report = self.coordinator.join(session_id).await?;
        self.outcome = None;
        let mut flow = QuizFlowController::multiplayer(Arc::clone(&self.quiz));
        if let Err(err) = flow.on_remote_answers(self.coordinator.remote_answers()) {
            warn!(%session_id, error = %err, "stored host answers rejected");
        }
        self.flow = Some(flow);
        Ok(report)
    }

    /// Answer the current question. In a shared session the whole local
    /// sequence is published to the partner.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveQuiz` before a quiz starts, `AwaitingPartner` while the
    /// host waits for a guest, or the flow/coordinator error.
    pub async fn submit_answer(&mut self, answer: AnswerId) -> Result<FlowStep, QuizServiceError> {
        let Some(flow) = self.flow.as_mut() else {
            return Err(match self.coordinator.phase() {
                CoordinatorPhase::Waiting => QuizServiceError::AwaitingPartner,
                _ => QuizServiceError::NoActiveQuiz,
            });
        };

        let index = flow.index();
        let mode = flow.mode();
        if mode == QuizMode::Multiplayer {
            self.coordinator.ensure_can_publish(index)?;
        }
        let step = flow.select(answer)?;
        if mode == QuizMode::Multiplayer {
            self.coordinator.publish_local_answer(index, answer).await?;
        }
        self.after_step(step)?;
        Ok(step)
    }

    /// Wait for the next partner notification and apply it.
    ///
    /// Returns `Ok(None)` once no session is open or the channel is gone.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Flow` if the partner's sequence holds an
    /// answer that is not an option of its question. That sequence is not
    /// taken; a corrected one from the partner is accepted later.
    pub async fn next_remote(&mut self) -> Result<Option<FlowStep>, QuizServiceError> {
        let Some(update) = self.coordinator.next_update().await else {
            return Ok(None);
        };
        self.handle_remote(update).map(Some)
    }

    /// Apply every partner notification already delivered.
    ///
    /// # Errors
    ///
    /// See [`QuizService::next_remote`].
    pub fn drain_remote(&mut self) -> Result<FlowStep, QuizServiceError> {
        let update = self.coordinator.drain_updates();
        self.handle_remote(update)
    }

    /// Register a callback for the final outcome. Registered after the outcome
    /// exists, it is called right away.
    pub fn on_result(&mut self, mut listener: impl FnMut(&QuizOutcome) + Send + 'static) {
        if let Some(outcome) = self.outcome.as_ref() {
            listener(outcome);
        }
        self.listeners.push(Box::new(listener));
    }

    /// Leave the shared session (if any) and drop quiz progress.
    pub fn leave(&mut self) {
        self.coordinator.leave();
        self.flow = None;
        self.outcome = None;
    }

    fn handle_remote(&mut self, update: RemoteUpdate) -> Result<FlowStep, QuizServiceError> {
        if update.became_playing && self.flow.is_none() {
            info!(session_id = ?self.coordinator.session_id(), "partner joined, quiz unlocked");
            self.flow = Some(QuizFlowController::multiplayer(Arc::clone(&self.quiz)));
        }
        let Some(flow) = self.flow.as_mut() else {
            return Ok(FlowStep::Unchanged);
        };
        if flow.mode() == QuizMode::Solo || update.is_noop() {
            return Ok(FlowStep::Unchanged);
        }

        let step = flow
            .on_remote_answers(self.coordinator.remote_answers())
            .inspect_err(|err| warn!(error = %err, "partner answers rejected"))?;
        self.after_step(step)?;
        Ok(step)
    }

    fn after_step(&mut self, step: FlowStep) -> Result<(), QuizServiceError> {
        if step != FlowStep::Finished || self.outcome.is_some() {
            return Ok(());
        }
        let Some(flow) = self.flow.as_ref() else {
            return Ok(());
        };

        let outcome = build_outcome(&self.quiz, flow, self.coordinator.role())?;
        info!(
            mode = ?outcome.mode,
            archetype = %outcome.own.archetype,
            partner = ?outcome.partner.map(|p| p.archetype),
            "quiz outcome ready"
        );
        for listener in &mut self.listeners {
            listener(&outcome);
        }
        self.outcome = Some(outcome);
        Ok(())
    }
}

fn build_outcome(
    quiz: &Quiz,
    flow: &QuizFlowController,
    role: Option<Role>,
) -> Result<QuizOutcome, QuizError> {
    let own = scoring::score(&quiz.archetypes_for(flow.local_answers())?);
    if flow.mode() == QuizMode::Solo {
        return Ok(QuizOutcome {
            mode: QuizMode::Solo,
            role: None,
            own,
            partner: None,
            insight: None,
        });
    }

    let partner = scoring::score(&quiz.archetypes_for(flow.remote_answers())?);
    let (host, guest) = match role {
        Some(Role::Guest) => (partner, own),
        _ => (own, partner),
    };
    Ok(QuizOutcome {
        mode: QuizMode::Multiplayer,
        role,
        own,
        partner: Some(partner),
        insight: Some(compatibility::insight_for(host.archetype, guest.archetype)),
    })
}

impl fmt::Debug for QuizService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizService")
            .field("phase", &self.coordinator.phase())
            .field("flow", &self.flow)
            .field("outcome", &self.outcome)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
