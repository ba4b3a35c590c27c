use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::{AnswerId, SessionId};

//
// ─── STATUS & ROLE ─────────────────────────────────────────────────────────────
//

/// Lifecycle of a shared session record. Only `Waiting → Playing` exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Waiting,
    Playing,
}

impl SessionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Waiting => "waiting",
            SessionStatus::Playing => "playing",
        }
    }

    /// Whether moving from `self` to `next` keeps the status monotonic.
    #[must_use]
    pub fn allows(self, next: SessionStatus) -> bool {
        next >= self
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Participant role, fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Guest,
}

impl Role {
    #[must_use]
    pub fn partner(self) -> Role {
        match self {
            Role::Host => Role::Guest,
            Role::Guest => Role::Host,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Host => "host",
            Role::Guest => "guest",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── PATCH ────────────────────────────────────────────────────────────────────
//

/// Partial update of a session record, as written to the store and carried by
/// the sync channel. `None` fields are untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers_host: Option<Vec<AnswerId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers_guest: Option<Vec<AnswerId>>,
}

impl SessionPatch {
    #[must_use]
    pub fn status(status: SessionStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Patch carrying the full answer sequence for one role's slot.
    #[must_use]
    pub fn answers(role: Role, answers: Vec<AnswerId>) -> Self {
        match role {
            Role::Host => Self {
                answers_host: Some(answers),
                ..Self::default()
            },
            Role::Guest => Self {
                answers_guest: Some(answers),
                ..Self::default()
            },
        }
    }

    #[must_use]
    pub fn answers_for(&self, role: Role) -> Option<&[AnswerId]> {
        match role {
            Role::Host => self.answers_host.as_deref(),
            Role::Guest => self.answers_guest.as_deref(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.answers_host.is_none() && self.answers_guest.is_none()
    }
}

/// Which fields of a record actually changed when a patch was applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchEffect {
    pub status_changed: bool,
    pub host_answers_changed: bool,
    pub guest_answers_changed: bool,
}

impl PatchEffect {
    #[must_use]
    pub fn answers_changed(&self, role: Role) -> bool {
        match role {
            Role::Host => self.host_answers_changed,
            Role::Guest => self.guest_answers_changed,
        }
    }

    #[must_use]
    pub fn is_noop(&self) -> bool {
        !(self.status_changed || self.host_answers_changed || self.guest_answers_changed)
    }
}

//
// ─── SESSION ──────────────────────────────────────────────────────────────────
//

/// Shared record coordinating one two-party quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub status: SessionStatus,
    pub answers_host: Vec<AnswerId>,
    pub answers_guest: Vec<AnswerId>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// A freshly created record, waiting for a guest.
    #[must_use]
    pub fn new(id: SessionId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            status: SessionStatus::Waiting,
            answers_host: Vec::new(),
            answers_guest: Vec::new(),
            created_at,
        }
    }

    #[must_use]
    pub fn answers_for(&self, role: Role) -> &[AnswerId] {
        match role {
            Role::Host => &self.answers_host,
            Role::Guest => &self.answers_guest,
        }
    }

    /// Merge a patch into the record.
    ///
    /// Status never regresses. Answer slots are append-only, so a sequence shorter
    /// than the stored one is a stale delivery and is dropped; anything else
    /// replaces the slot (each slot has a single writer).
    pub fn apply(&mut self, patch: &SessionPatch) -> PatchEffect {
        let mut effect = PatchEffect::default();

        if let Some(next) = patch.status {
            if next != self.status && self.status.allows(next) {
                self.status = next;
                effect.status_changed = true;
            }
        }
        if let Some(answers) = patch.answers_host.as_deref() {
            effect.host_answers_changed = merge_answers(&mut self.answers_host, answers);
        }
        if let Some(answers) = patch.answers_guest.as_deref() {
            effect.guest_answers_changed = merge_answers(&mut self.answers_guest, answers);
        }

        effect
    }
}

fn merge_answers(slot: &mut Vec<AnswerId>, incoming: &[AnswerId]) -> bool {
    if incoming.len() < slot.len() || incoming == slot.as_slice() {
        return false;
    }
    slot.clear();
    slot.extend_from_slice(incoming);
    true
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn ids(raw: &[u64]) -> Vec<AnswerId> {
        raw.iter().copied().map(AnswerId::new).collect()
    }

    #[test]
    fn status_is_monotonic() {
        let mut session = Session::new(SessionId::generate(), fixed_now());

        let effect = session.apply(&SessionPatch::status(SessionStatus::Playing));
        assert!(effect.status_changed);

        let effect = session.apply(&SessionPatch::status(SessionStatus::Waiting));
        assert!(effect.is_noop());
        assert_eq!(session.status, SessionStatus::Playing);
    }

    #[test]
    fn stale_answer_sequence_is_dropped() {
        let mut session = Session::new(SessionId::generate(), fixed_now());
        session.apply(&SessionPatch::answers(Role::Guest, ids(&[1, 2])));

        let effect = session.apply(&SessionPatch::answers(Role::Guest, ids(&[1])));
        assert!(!effect.guest_answers_changed);
        assert_eq!(session.answers_guest, ids(&[1, 2]));
    }

    #[test]
    fn duplicate_patch_is_a_noop() {
        let mut session = Session::new(SessionId::generate(), fixed_now());
        let patch = SessionPatch::answers(Role::Host, ids(&[5]));

        assert!(session.apply(&patch).host_answers_changed);
        assert!(session.apply(&patch).is_noop());
    }

    #[test]
    fn slots_are_independent() {
        let mut session = Session::new(SessionId::generate(), fixed_now());
        session.apply(&SessionPatch::answers(Role::Host, ids(&[1, 2, 3])));
        session.apply(&SessionPatch::answers(Role::Guest, ids(&[9])));

        assert_eq!(session.answers_for(Role::Host).len(), 3);
        assert_eq!(session.answers_for(Role::Guest), ids(&[9]).as_slice());
    }

    #[test]
    fn partner_of_partner_is_self() {
        assert_eq!(Role::Host.partner(), Role::Guest);
        assert_eq!(Role::Guest.partner().partner(), Role::Guest);
    }
}
