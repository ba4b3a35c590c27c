//! Pairwise archetype compatibility.
//!
//! Every unordered pair of archetypes maps to one curated [`CoupleInsight`].
//! Lookups go through a canonical key so that argument order never matters.

use crate::model::{Archetype, CoupleInsight};

/// Separator between the two archetype names of a pair key.
pub const PAIR_KEY_SEPARATOR: char = '+';

/// Canonical key for an unordered pair: both names sorted, then joined.
#[must_use]
pub fn pair_key(a: Archetype, b: Archetype) -> String {
    let (first, second) = if a.name() <= b.name() {
        (a.name(), b.name())
    } else {
        (b.name(), a.name())
    };
    format!("{first}{PAIR_KEY_SEPARATOR}{second}")
}

/// Insight for two archetypes, in either order.
#[must_use]
pub fn insight_for(a: Archetype, b: Archetype) -> &'static CoupleInsight {
    insight_for_key(&pair_key(a, b))
}

/// Insight for a raw pair key, falling back to [`FALLBACK`] for anything uncurated.
#[must_use]
pub fn insight_for_key(key: &str) -> &'static CoupleInsight {
    curated(key).unwrap_or(&FALLBACK)
}

/// Whether a key has a curated entry.
#[must_use]
pub fn is_curated(key: &str) -> bool {
    curated(key).is_some()
}

fn curated(key: &str) -> Option<&'static CoupleInsight> {
    INSIGHTS
        .iter()
        .find(|(entry_key, _)| *entry_key == key)
        .map(|(_, insight)| insight)
}

pub static FALLBACK: CoupleInsight = CoupleInsight {
    title: "A Pair Still Getting Acquainted",
    description: "Your money styles don't fit a pattern we have seen before.",
    extended_description: "Every couple is a little different. Use your individual results \
        as a starting point and compare where each of you landed on the discipline, \
        security and horizon axes.",
    tips: &[
        "Walk each other through your individual results.",
        "Pick one shared goal and agree on a first small step.",
    ],
    compatibility_score: 50,
};

// Keys are sorted by name: dreamer < guardian < hedonist < strategist.
static INSIGHTS: [(&str, CoupleInsight); 10] = [
    (
        "guardian+guardian",
        CoupleInsight {
            title: "The Fortress",
            description: "Two savers who sleep well knowing the emergency fund is full.",
            extended_description: "You agree on caution and rarely argue about spending. \
                The risk is missing out: money kept safe can also be money that never works \
                for you or never gets enjoyed.",
            tips: &[
                "Schedule a yearly 'joy budget' you are both required to spend.",
                "Move part of the surplus into long-term investments.",
                "Celebrate milestones so saving doesn't feel like sacrifice.",
            ],
            compatibility_score: 88,
        },
    ),
    (
        "strategist+strategist",
        CoupleInsight {
            title: "The Boardroom",
            description: "Two planners with spreadsheets, targets and opinions.",
            extended_description: "You share ambition and speak the same language about \
                returns. Friction shows up when both of you want to own the plan; decide \
                who leads which part of your finances.",
            tips: &[
                "Split ownership of accounts or goals instead of co-editing everything.",
                "Keep one shared dashboard both of you trust.",
                "Leave room for spending that isn't optimised.",
            ],
            compatibility_score: 82,
        },
    ),
    (
        "hedonist+hedonist",
        CoupleInsight {
            title: "The Adventure",
            description: "Life is for living, and you both agree on how to live it.",
            extended_description: "Shared experiences are your glue. Without a plan, \
                though, the bills and the future tend to arrive at the same time. A few \
                automatic rules protect the fun.",
            tips: &[
                "Automate savings on payday before anything else happens.",
                "Give every big trip a dedicated savings pot.",
                "Review subscriptions together every quarter.",
            ],
            compatibility_score: 74,
        },
    ),
    (
        "dreamer+dreamer",
        CoupleInsight {
            title: "The Castle in the Clouds",
            description: "Big shared visions, very few spreadsheets.",
            extended_description: "You inspire each other and rarely fight about money, \
                mostly because money rarely gets discussed. Turning one dream into a dated, \
                costed goal is the fastest way to make it real.",
            tips: &[
                "Hold a short monthly money date with a fixed agenda.",
                "Write down one dream with a price and a deadline.",
                "Let an app or advisor handle the details you both avoid.",
            ],
            compatibility_score: 66,
        },
    ),
    (
        "guardian+strategist",
        CoupleInsight {
            title: "The Architects",
            description: "A careful saver and a long-term planner building the same house.",
            extended_description: "The Guardian brings safety nets, the Strategist brings \
                growth. Agree on how much risk the household carries and you will move \
                steadily towards your goals.",
            tips: &[
                "Agree on a risk budget before investing.",
                "Keep the emergency fund separate from the investment plan.",
                "Review progress together twice a year.",
            ],
            compatibility_score: 92,
        },
    ),
    (
        "guardian+hedonist",
        CoupleInsight {
            title: "The Anchor and the Sail",
            description: "One of you saves for tomorrow, the other lives for today.",
            extended_description: "This pairing balances well when both styles are \
                respected and fights hard when one tries to convert the other. Clear \
                personal spending allowances remove most of the tension.",
            tips: &[
                "Give each partner a no-questions-asked personal allowance.",
                "Fund shared experiences from a separate pot.",
                "Let the Guardian automate the essentials.",
            ],
            compatibility_score: 68,
        },
    ),
    (
        "dreamer+guardian",
        CoupleInsight {
            title: "The Keeper and the Visionary",
            description: "Imagination meets caution.",
            extended_description: "The Dreamer sees where you could go, the Guardian makes \
                sure you don't fall on the way. Translate visions into savings targets so \
                both of you can say yes to them.",
            tips: &[
                "Turn each new idea into a savings target before committing.",
                "Let the Guardian run the household budget with regular check-ins.",
                "Make room for one dream at a time.",
            ],
            compatibility_score: 76,
        },
    ),
    (
        "hedonist+strategist",
        CoupleInsight {
            title: "The Deal Makers",
            description: "Returns on paper meet returns in memories.",
            extended_description: "The Strategist optimises, the Hedonist enjoys. Decide \
                up front which share of income is for growth and which is for living, and \
                neither side has to defend every purchase.",
            tips: &[
                "Split income into growth, needs and fun percentages.",
                "Let the Strategist pick the vehicles, the Hedonist the rewards.",
                "Review the split when income changes.",
            ],
            compatibility_score: 71,
        },
    ),
    (
        "dreamer+strategist",
        CoupleInsight {
            title: "The Launch Team",
            description: "A visionary and a planner with a shared horizon.",
            extended_description: "Both of you think long-term. The Dreamer supplies the \
                destination and the Strategist the route; the risk is planning forever \
                without ever starting.",
            tips: &[
                "Put a start date on the next big plan.",
                "Break long-term goals into quarterly steps.",
                "Let the Dreamer pick goals and the Strategist pick the path.",
            ],
            compatibility_score: 84,
        },
    ),
    (
        "dreamer+hedonist",
        CoupleInsight {
            title: "The Free Spirits",
            description: "Plenty of fun, not much paperwork.",
            extended_description: "You share a relaxed attitude towards money, which keeps \
                the peace but leaves the future unattended. A few automatic safeguards let \
                you stay spontaneous without surprises.",
            tips: &[
                "Automate bills and savings so nothing depends on memory.",
                "Keep a buffer account for the unexpected.",
                "Check your balances together once a month.",
            ],
            compatibility_score: 62,
        },
    ),
];

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_symmetric() {
        for a in Archetype::ALL {
            for b in Archetype::ALL {
                assert_eq!(pair_key(a, b), pair_key(b, a));
                assert_eq!(insight_for(a, b), insight_for(b, a));
            }
        }
    }

    #[test]
    fn every_unordered_pair_is_curated() {
        let mut keys = Vec::new();
        for (i, a) in Archetype::ALL.iter().enumerate() {
            for b in &Archetype::ALL[i..] {
                let key = pair_key(*a, *b);
                assert!(is_curated(&key), "missing entry for {key}");
                assert_ne!(insight_for(*a, *b), &FALLBACK);
                keys.push(key);
            }
        }
        assert_eq!(keys.len(), 10);
    }

    #[test]
    fn table_keys_are_canonical_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for (key, _) in &INSIGHTS {
            let (first, second) = key.split_once(PAIR_KEY_SEPARATOR).unwrap();
            assert!(first <= second, "{key} is not sorted");
            assert!(seen.insert(*key), "{key} repeated");
        }
    }

    #[test]
    fn unknown_keys_fall_back() {
        assert_eq!(insight_for_key("strategist+guardian"), &FALLBACK);
        assert_eq!(insight_for_key(""), &FALLBACK);
        assert_eq!(insight_for_key("miser+miser"), &FALLBACK);
        assert!(!is_curated("guardian"));
    }

    #[test]
    fn scores_are_percentages() {
        for (_, insight) in &INSIGHTS {
            assert!(insight.compatibility_score <= 100);
            assert!(!insight.tips.is_empty());
        }
    }

    #[test]
    fn key_sorts_by_name() {
        assert_eq!(
            pair_key(Archetype::Strategist, Archetype::Guardian),
            "guardian+strategist"
        );
    }
}
