use serde::{Deserialize, Serialize};

use crate::model::Archetype;

//
// ─── TALLY ─────────────────────────────────────────────────────────────────────
//

/// Per-archetype answer counts, indexed in enumeration order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchetypeTally {
    counts: [u32; 4],
}

impl ArchetypeTally {
    /// Count archetypes by a single linear scan.
    #[must_use]
    pub fn from_archetypes<I>(archetypes: I) -> Self
    where
        I: IntoIterator<Item = Archetype>,
    {
        let mut tally = Self::default();
        for archetype in archetypes {
            let slot = &mut tally.counts[archetype.index()];
            *slot = slot.saturating_add(1);
        }
        tally
    }

    #[must_use]
    pub fn count(&self, archetype: Archetype) -> u32 {
        self.counts[archetype.index()]
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.counts.iter().fold(0_u32, |acc, c| acc.saturating_add(*c))
    }

    /// Archetype with the highest count.
    ///
    /// Ties go to the archetype that comes first in enumeration order, which also
    /// makes an empty tally resolve to `Archetype::Guardian`.
    #[must_use]
    pub fn dominant(&self) -> Archetype {
        let mut best = Archetype::ALL[0];
        for archetype in Archetype::ALL.into_iter().skip(1) {
            // strict comparison keeps the earlier archetype on ties
            if self.count(archetype) > self.count(best) {
                best = archetype;
            }
        }
        best
    }

    fn sum(&self, group: [Archetype; 2]) -> u32 {
        self.count(group[0]).saturating_add(self.count(group[1]))
    }
}

//
// ─── AXES ──────────────────────────────────────────────────────────────────────
//

/// The three derived bipolar axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Discipline,
    Security,
    Horizon,
}

/// Which archetype pair pulls an axis left (towards 0) and right (towards 100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisGrouping {
    pub axis: Axis,
    pub left: [Archetype; 2],
    pub right: [Archetype; 2],
}

/// Fixed grouping table used for every result.
pub const AXIS_GROUPINGS: [AxisGrouping; 3] = [
    AxisGrouping {
        axis: Axis::Discipline,
        left: [Archetype::Hedonist, Archetype::Dreamer],
        right: [Archetype::Guardian, Archetype::Strategist],
    },
    AxisGrouping {
        axis: Axis::Security,
        left: [Archetype::Strategist, Archetype::Hedonist],
        right: [Archetype::Guardian, Archetype::Dreamer],
    },
    AxisGrouping {
        axis: Axis::Horizon,
        left: [Archetype::Guardian, Archetype::Hedonist],
        right: [Archetype::Strategist, Archetype::Dreamer],
    },
];

/// Axis scores, each in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axes {
    pub discipline: u8,
    pub security: u8,
    pub horizon: u8,
}

impl Axes {
    #[must_use]
    pub fn get(&self, axis: Axis) -> u8 {
        match axis {
            Axis::Discipline => self.discipline,
            Axis::Security => self.security,
            Axis::Horizon => self.horizon,
        }
    }
}

/// `round(right / (left + right) * 100)`, rounding halves up; `50` when both are zero.
#[must_use]
pub fn axis_score(left: u32, right: u32) -> u8 {
    let total = u64::from(left) + u64::from(right);
    if total == 0 {
        return 50;
    }
    let scaled = (u64::from(right) * 200 + total) / (total * 2);
    u8::try_from(scaled).unwrap_or(100)
}

//
// ─── RESULT ────────────────────────────────────────────────────────────────────
//

/// Individual quiz result for one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub archetype: Archetype,
    pub axes: Axes,
    pub tally: ArchetypeTally,
}

/// Score an answered sequence.
///
/// # Examples
///
/// ```
/// # use quiz_core::model::Archetype;
/// # use quiz_core::scoring::score;
/// let result = score(&[Archetype::Dreamer, Archetype::Guardian, Archetype::Strategist]);
/// assert_eq!(result.archetype, Archetype::Guardian);
/// ```
#[must_use]
pub fn score(archetypes: &[Archetype]) -> QuizResult {
    let tally = ArchetypeTally::from_archetypes(archetypes.iter().copied());
    score_tally(tally)
}

#[must_use]
pub fn score_tally(tally: ArchetypeTally) -> QuizResult {
    // table order is discipline, security, horizon
    let [discipline, security, horizon] =
        AXIS_GROUPINGS.map(|g| axis_score(tally.sum(g.left), tally.sum(g.right)));

    QuizResult {
        archetype: tally.dominant(),
        axes: Axes {
            discipline,
            security,
            horizon,
        },
        tally,
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
