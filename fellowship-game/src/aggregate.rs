//! Stat aggregation from leader, members, boosts and temporary percentages.
use crate::numbers::floor_f64_to_i32;
use crate::state::{MemberInstance, PermanentBoosts, RunState};
use crate::stats::{Stats, TempBoosts};

/// What one member adds to the fellowship.
///
/// Each primary stat gets the level-scaled value plus any permanent boost on
/// that stat. Boosts recorded on non-primary stats are added flat.
#[must_use]
pub fn member_contribution(member: &MemberInstance, boosts: &PermanentBoosts) -> Stats {
    let mut contribution = Stats::default();
    let scaled = member.scaled_value();
    for stat in &member.primary_stats {
        contribution[*stat] += scaled + boosts.get(&member.id, *stat);
    }
    for (stat, bonus) in boosts.for_member(&member.id) {
        if !member.is_primary(stat) {
            contribution[stat] += bonus;
        }
    }
    contribution
}

/// Aggregate stats for `state`, optionally scaled by temporary percentages.
///
/// Pure: reads only its arguments.
#[must_use]
pub fn compute_stats(state: &RunState, temp_boosts: Option<&TempBoosts>) -> Stats {
    let mut stats = state.leader.base_stats;
    for member in &state.members {
        for (stat, value) in member_contribution(member, &state.permanent_boosts).iter() {
            stats[stat] += value;
        }
    }
    if let Some(boosts) = temp_boosts {
        for (stat, pct) in boosts {
            let scaled = f64::from(stats[*stat]) * (1.0 + f64::from(*pct) / 100.0);
            stats[*stat] = floor_f64_to_i32(scaled);
        }
    }
    stats
}

/// Summed percentages of every next-segment boost active for the segment
/// about to be played.
#[must_use]
pub fn active_temp_boosts(state: &RunState) -> TempBoosts {
    let mut boosts = TempBoosts::new();
    for tactic in state
        .tactics
        .iter()
        .filter(|tactic| tactic.is_active_for(state.segment_index))
    {
        *boosts.entry(tactic.stat).or_insert(0) += tactic.value;
    }
    boosts
}
