use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArchetypeError {
    #[error("unknown archetype: {0}")]
    Unknown(String),
}

//
// ─── ARCHETYPE ────────────────────────────────────────────────────────────────
//

/// The four fixed money archetypes an answer option can be tagged with.
///
/// Declaration order is the enumeration order `A, B, C, D` and is load-bearing:
/// scoring resolves ties to the archetype declared first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Archetype {
    /// A: protects what is already there, saves first.
    Guardian,
    /// B: plans and invests for compounding results.
    Strategist,
    /// C: spends on experiences and the present moment.
    Hedonist,
    /// D: thinks in big pictures and would rather not look at the numbers.
    Dreamer,
}

impl Archetype {
    /// All archetypes in enumeration order.
    pub const ALL: [Archetype; 4] = [
        Archetype::Guardian,
        Archetype::Strategist,
        Archetype::Hedonist,
        Archetype::Dreamer,
    ];

    /// Position in the enumeration order (0-based).
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Archetype::Guardian => 0,
            Archetype::Strategist => 1,
            Archetype::Hedonist => 2,
            Archetype::Dreamer => 3,
        }
    }

    /// Stable lowercase name, used for pairing keys and persistence.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Archetype::Guardian => "guardian",
            Archetype::Strategist => "strategist",
            Archetype::Hedonist => "hedonist",
            Archetype::Dreamer => "dreamer",
        }
    }

    /// Human readable title.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Archetype::Guardian => "The Guardian",
            Archetype::Strategist => "The Strategist",
            Archetype::Hedonist => "The Hedonist",
            Archetype::Dreamer => "The Dreamer",
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Archetype {
    type Err = ArchetypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Archetype::ALL
            .into_iter()
            .find(|a| a.name() == needle)
            .ok_or_else(|| ArchetypeError::Unknown(s.to_owned()))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumeration_order_matches_index() {
        for (i, archetype) in Archetype::ALL.iter().enumerate() {
            assert_eq!(archetype.index(), i);
        }
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("Hedonist".parse::<Archetype>().unwrap(), Archetype::Hedonist);
        assert_eq!(" dreamer ".parse::<Archetype>().unwrap(), Archetype::Dreamer);
    }

    #[test]
    fn unknown_name_fails_fast() {
        let err = "miser".parse::<Archetype>().unwrap_err();
        assert_eq!(err, ArchetypeError::Unknown("miser".into()));
    }
}
