//! Run state and run creation.
//!
//! [`RunState`] is a plain value. Core operations take it by reference and
//! hand back a fresh copy, so two states never share mutable structure.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregate::compute_stats;
use crate::catalog::{Catalog, GearKind, Leader, MemberTemplate, StatTags, TacticKind};
use crate::constants::SEGMENT_COUNT;
use crate::curriculum::{SegmentDefinition, generate_segments};
use crate::error::{FellowshipError, FellowshipResult};
use crate::rng::{DeterministicRng, Seed};
use crate::stats::{Stat, Stats};

/// A recruited fellowship member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInstance {
    pub id: String,
    pub template_id: String,
    pub name: String,
    pub primary_stats: StatTags,
    pub rank: u8,
    pub base_value: i32,
    pub scaling: i32,
    pub level: u32,
}

impl MemberInstance {
    #[must_use]
    pub fn from_template(id: String, template: &MemberTemplate) -> Self {
        Self {
            id,
            template_id: template.id.clone(),
            name: template.name.clone(),
            primary_stats: template.primary_stats.clone(),
            rank: template.rank,
            base_value: template.base_value,
            scaling: template.scaling,
            level: 1,
        }
    }

    #[must_use]
    pub fn is_primary(&self, stat: Stat) -> bool {
        self.primary_stats.contains(&stat)
    }

    /// Level-scaled value for one primary stat, before boosts.
    #[must_use]
    pub fn scaled_value(&self) -> i32 {
        let levels_gained = i32::try_from(self.level.saturating_sub(1)).unwrap_or(i32::MAX);
        self.base_value
            .saturating_add(self.scaling.saturating_mul(levels_gained))
    }
}

/// A stored consumable. Only auto-success gear is ever stored; extra-slot and
/// heal gear resolve the moment they are drafted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GearInstance {
    pub id: String,
    pub template_id: String,
    pub name: String,
    pub kind: GearKind,
    pub stat: Stat,
    /// Margin above the threshold a consumed token forces the stat to.
    pub value: i32,
    pub used: bool,
}

/// A stored tactic. Only next-segment boosts are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TacticInstance {
    pub id: String,
    pub template_id: String,
    pub name: String,
    pub kind: TacticKind,
    pub stat: Stat,
    /// Percentage applied to `stat` for the segment it is active in.
    pub value: i32,
    pub expires_after_segment: u32,
    pub used: bool,
}

impl TacticInstance {
    #[must_use]
    pub fn is_active_for(&self, segment_index: u32) -> bool {
        !self.used
            && self.kind == TacticKind::NextSegmentBoost
            && self.expires_after_segment == segment_index
    }
}

/// Cumulative per-member, per-stat boosts. Entries only ever grow.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PermanentBoosts(BTreeMap<String, BTreeMap<Stat, i32>>);

impl PermanentBoosts {
    pub fn add(&mut self, member_id: &str, stat: Stat, amount: i32) {
        let entry = self
            .0
            .entry(member_id.to_string())
            .or_default()
            .entry(stat)
            .or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    #[must_use]
    pub fn get(&self, member_id: &str, stat: Stat) -> i32 {
        self.0
            .get(member_id)
            .and_then(|stats| stats.get(&stat))
            .copied()
            .unwrap_or(0)
    }

    pub fn for_member(&self, member_id: &str) -> impl Iterator<Item = (Stat, i32)> + '_ {
        self.0
            .get(member_id)
            .into_iter()
            .flat_map(|stats| stats.iter().map(|(stat, value)| (*stat, *value)))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Complete snapshot of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    /// Snapshot of the chosen leader; empty-fellowship boosts land on its
    /// base stats.
    pub leader: Leader,
    pub hp: i32,
    pub max_hp: i32,
    pub stats: Stats,
    pub members: Vec<MemberInstance>,
    pub member_slots: u32,
    /// 1-based; the run is complete once this exceeds the segment count.
    pub segment_index: u32,
    pub segments: Vec<SegmentDefinition>,
    pub gear: Vec<GearInstance>,
    pub tactics: Vec<TacticInstance>,
    pub permanent_boosts: PermanentBoosts,
    pub seed: Seed,
    pub event_log: Vec<String>,
    pub skip_next_event: bool,
    next_member_seq: u32,
    next_item_seq: u32,
}

impl RunState {
    /// Segment about to be played, if any remain.
    #[must_use]
    pub fn current_segment(&self) -> Option<&SegmentDefinition> {
        self.segments
            .iter()
            .find(|segment| segment.index == self.segment_index)
    }

    #[must_use]
    pub fn member(&self, id: &str) -> Option<&MemberInstance> {
        self.members.iter().find(|member| member.id == id)
    }

    #[must_use]
    pub fn total_levels(&self) -> u32 {
        self.members.iter().map(|member| member.level).sum()
    }

    #[must_use]
    pub fn has_free_slot(&self) -> bool {
        self.members.len() < self.member_slots as usize
    }

    /// Number of segments fully survived.
    #[must_use]
    pub const fn segments_cleared(&self) -> u32 {
        self.segment_index.saturating_sub(1)
    }

    /// First unspent auto-success token for `stat`.
    pub fn unused_gear_for_mut(&mut self, stat: Stat) -> Option<&mut GearInstance> {
        self.gear
            .iter_mut()
            .find(|gear| !gear.used && gear.kind == GearKind::AutoSuccess && gear.stat == stat)
    }

    pub(crate) fn next_member_id(&mut self) -> String {
        let id = format!("m{}", self.next_member_seq);
        self.next_member_seq += 1;
        id
    }

    pub(crate) fn next_item_id(&mut self, prefix: char) -> String {
        let id = format!("{prefix}{}", self.next_item_seq);
        self.next_item_seq += 1;
        id
    }

    pub(crate) fn record(&mut self, line: impl Into<String>) {
        self.event_log.push(line.into());
    }

    /// Copy of this state without its transcript, for equality and digest
    /// checks that should ignore presentation text.
    #[must_use]
    pub fn without_log(&self) -> Self {
        Self {
            event_log: Vec::new(),
            ..self.clone()
        }
    }

    /// Bare state for tests and tools that assemble a fellowship by hand.
    #[must_use]
    pub fn blank(leader: Leader, max_hp: i32, member_slots: u32, seed: Seed) -> Self {
        Self {
            leader,
            hp: max_hp,
            max_hp,
            stats: Stats::default(),
            members: Vec::new(),
            member_slots,
            segment_index: 1,
            segments: Vec::new(),
            gear: Vec::new(),
            tactics: Vec::new(),
            permanent_boosts: PermanentBoosts::default(),
            seed,
            event_log: Vec::new(),
            skip_next_event: false,
            next_member_seq: 1,
            next_item_seq: 1,
        }
    }

    /// Append a level-1 member built from `template`, returning its id.
    pub fn recruit(&mut self, template: &MemberTemplate) -> String {
        let id = self.next_member_id();
        self.members
            .push(MemberInstance::from_template(id.clone(), template));
        id
    }
}

/// Start a run for `leader_id`.
///
/// Seeds the run's single RNG, spends its first draws on the curriculum and
/// returns it so the caller can thread it through every draft that follows.
///
/// # Errors
///
/// Returns [`FellowshipError::LeaderNotFound`] for an unknown leader,
/// [`FellowshipError::UnknownMemberTemplate`] for a dangling starting member,
/// and [`FellowshipError::EmptyInput`] when a flavor pool is empty.
pub fn create_run(
    catalog: &Catalog,
    leader_id: &str,
    seed: impl Into<Seed>,
) -> FellowshipResult<(RunState, DeterministicRng)> {
    let leader = catalog
        .leader(leader_id)
        .ok_or_else(|| FellowshipError::LeaderNotFound(leader_id.to_string()))?;
    let seed = seed.into();
    let mut rng = DeterministicRng::new(&seed);

    let max_hp = catalog.base_hp.saturating_add(leader.hp_bonus);
    let mut state = RunState::blank(leader.clone(), max_hp, catalog.base_member_slots, seed);
    for template_id in &catalog.starting_members {
        let template = catalog
            .member_template(template_id)
            .ok_or_else(|| FellowshipError::UnknownMemberTemplate(template_id.clone()))?;
        state.recruit(template);
    }

    state.segments = generate_segments(catalog, &mut rng)?;
    state.stats = compute_stats(&state, None);
    state.record(format!(
        "{} sets out with {} companion(s). HP {}/{}.",
        leader.name,
        state.members.len(),
        state.hp,
        state.max_hp
    ));
    log::debug!(
        "run created for leader '{}' with seed '{}'",
        leader.id,
        state.seed
    );
    Ok((state, rng))
}

/// True once the fellowship has fallen or cleared every segment.
#[must_use]
pub const fn is_run_over(state: &RunState) -> bool {
    state.hp <= 0 || state.segment_index > SEGMENT_COUNT
}
