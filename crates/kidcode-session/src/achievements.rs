//! Milestones unlocked by building programs.

use kidcode_graph::GraphStats;

pub const FIRST_PROGRAM: &str = "First Program";
pub const CATEGORY_MASTER: &str = "Category Master";
pub const CODE_WIZARD: &str = "Code Wizard";
/// Unlocked by choosing a character rather than by graph statistics.
pub const CHARACTER_SELECTED: &str = "Character Selected!";

struct Milestone {
    id: &'static str,
    reached: fn(&GraphStats) -> bool,
}

const MILESTONES: &[Milestone] = &[
    Milestone {
        id: FIRST_PROGRAM,
        reached: |s| s.block_count >= 3,
    },
    Milestone {
        id: CATEGORY_MASTER,
        reached: |s| s.distinct_category_count >= 3,
    },
    Milestone {
        id: CODE_WIZARD,
        reached: |s| s.block_count >= 10,
    },
];

/// Milestones `stats` reaches that are not in `already_unlocked`, in
/// milestone order.
pub fn evaluate<S: AsRef<str>>(stats: &GraphStats, already_unlocked: &[S]) -> Vec<&'static str> {
    MILESTONES
        .iter()
        .filter(|m| (m.reached)(stats))
        .filter(|m| !already_unlocked.iter().any(|u| u.as_ref() == m.id))
        .map(|m| m.id)
        .collect()
}
