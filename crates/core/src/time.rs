use chrono::{DateTime, Utc};

/// Source of the `created_at` stamp on new session records.
///
/// Stores take the timestamp as an argument; the coordinator passes
/// `clock.now()` so tests can pin it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    /// Wall-clock time.
    #[default]
    System,
    /// Every session is stamped with the same instant.
    Fixed(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn system() -> Self {
        Self::System
    }

    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(at) => *at,
        }
    }
}

/// Seconds since the epoch used for pinned session stamps (2023-11-14T22:13:20Z).
pub const FIXED_SESSION_TIMESTAMP: i64 = 1_700_000_000;

/// The pinned session stamp as a `DateTime<Utc>`.
///
/// # Panics
///
/// Panics if the constant is out of chrono's range, which it is not.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_SESSION_TIMESTAMP, 0)
        .expect("fixed session timestamp should be valid")
}

/// A `Clock` pinned at [`fixed_now`], for tests that compare session records.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
