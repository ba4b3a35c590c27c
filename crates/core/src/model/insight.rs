use serde::Serialize;

/// Curated description of how two archetypes get along with money.
///
/// Entries are static content; the lookup that produces them lives in
/// `crate::compatibility`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoupleInsight {
    pub title: &'static str,
    pub description: &'static str,
    pub extended_description: &'static str,
    pub tips: &'static [&'static str],
    /// Always within `0..=100`.
    pub compatibility_score: u8,
}
