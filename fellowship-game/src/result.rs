//! End-of-run scoring and summary.
use serde::{Deserialize, Serialize};

use crate::constants::{SCORE_PER_HP, SCORE_PER_LEVEL, SCORE_PER_SEGMENT, VICTORY_BONUS};
use crate::rng::Seed;
use crate::state::{RunState, is_run_over};
use crate::stats::Stats;

/// How a run ended, if it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Ending {
    /// Every segment cleared with HP remaining.
    Victory,
    /// HP reached zero during the given segment.
    Fallen { segment: u32 },
    /// The run can still continue.
    InProgress,
}

impl std::fmt::Display for Ending {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ending::Victory => write!(f, "victory"),
            Ending::Fallen { segment } => write!(f, "fallen in segment {segment}"),
            Ending::InProgress => write!(f, "in progress"),
        }
    }
}

/// Classify the state by strict priority: a fallen fellowship outranks a
/// finished curriculum.
#[must_use]
pub const fn select_ending(state: &RunState) -> Ending {
    if state.hp <= 0 {
        return Ending::Fallen {
            segment: state.segment_index,
        };
    }
    if is_run_over(state) {
        return Ending::Victory;
    }
    Ending::InProgress
}

/// Each additive term of the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub segments: i64,
    pub hp: i64,
    pub stats: i64,
    pub levels: i64,
    pub victory: i64,
}

impl ScoreBreakdown {
    #[must_use]
    pub fn for_state(state: &RunState) -> Self {
        let victory = matches!(select_ending(state), Ending::Victory);
        Self {
            segments: SCORE_PER_SEGMENT * i64::from(state.segments_cleared()),
            hp: SCORE_PER_HP * i64::from(state.hp),
            stats: i64::from(state.stats.total()),
            levels: SCORE_PER_LEVEL * i64::from(state.total_levels()),
            victory: if victory { VICTORY_BONUS } else { 0 },
        }
    }

    #[must_use]
    pub const fn total(&self) -> i64 {
        self.segments + self.hp + self.stats + self.levels + self.victory
    }
}

/// Final score: a pure function of the state.
#[must_use]
pub fn score_run(state: &RunState) -> i64 {
    ScoreBreakdown::for_state(state).total()
}

/// Compact record of a run for result screens and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ending: Ending,
    pub leader_id: String,
    pub leader_name: String,
    pub seed: Seed,
    pub score: i64,
    pub breakdown: ScoreBreakdown,
    pub segments_cleared: u32,
    pub hp: i32,
    pub max_hp: i32,
    pub members: usize,
    pub total_levels: u32,
    pub stats: Stats,
}

#[must_use]
pub fn summarize_run(state: &RunState) -> RunSummary {
    let breakdown = ScoreBreakdown::for_state(state);
    RunSummary {
        ending: select_ending(state),
        leader_id: state.leader.id.clone(),
        leader_name: state.leader.name.clone(),
        seed: state.seed.clone(),
        score: breakdown.total(),
        breakdown,
        segments_cleared: state.segments_cleared(),
        hp: state.hp,
        max_hp: state.max_hp,
        members: state.members.len(),
        total_levels: state.total_levels(),
        stats: state.stats,
    }
}
