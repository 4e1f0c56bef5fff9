//! Content catalog: leaders, templates, flavor pools and tuning.
//!
//! The catalog is plain configuration. Callers construct it once (usually
//! from JSON) and pass it by reference into every core operation; the core
//! never holds a process-wide copy.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashSet};

use crate::error::{FellowshipError, FellowshipResult};
use crate::stats::{Stat, Stats};

/// Primary stat tags of a member; almost always one or two.
pub type StatTags = SmallVec<[Stat; 2]>;

/// A fellowship leader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leader {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub base_stats: Stats,
    #[serde(default)]
    pub hp_bonus: i32,
    /// Name of the themed tactic pool; defaults to the leader id.
    #[serde(default)]
    pub tactic_pool: Option<String>,
}

impl Leader {
    #[must_use]
    pub fn tactic_pool_key(&self) -> &str {
        self.tactic_pool.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    pub primary_stats: StatTags,
    pub rank: u8,
    pub base_value: i32,
    pub scaling: i32,
}

impl MemberTemplate {
    #[must_use]
    pub fn shares_primary(&self, stats: &[Stat]) -> bool {
        self.primary_stats.iter().any(|stat| stats.contains(stat))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GearKind {
    /// Permanently adds one member slot.
    ExtraSlot,
    /// Restores HP immediately.
    Heal,
    /// Forces the next check of one stat to pass.
    AutoSuccess,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GearTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    pub kind: GearKind,
    #[serde(default)]
    pub stat: Option<Stat>,
    /// Overrides the tuning default for this kind.
    #[serde(default)]
    pub value: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TacticKind {
    PermanentBoost,
    NextSegmentBoost,
    SkipEvent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TacticTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    pub kind: TacticKind,
    #[serde(default)]
    pub stat: Option<Stat>,
    #[serde(default)]
    pub value: Option<i32>,
}

/// Flavor text for a generated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTemplate {
    pub name: String,
    pub description: String,
}

/// Balance knobs the core reads but never hardcodes. Every catalog must
/// carry all four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuning {
    pub heal_amount: i32,
    pub auto_success_margin: i32,
    pub permanent_boost: i32,
    pub next_segment_boost_pct: i32,
}

/// Complete content configuration for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub base_hp: i32,
    pub base_member_slots: u32,
    pub leaders: Vec<Leader>,
    pub members: Vec<MemberTemplate>,
    pub gear: Vec<GearTemplate>,
    pub tactics: Vec<TacticTemplate>,
    #[serde(default)]
    pub tactic_pools: BTreeMap<String, Vec<TacticTemplate>>,
    #[serde(default)]
    pub starting_members: Vec<String>,
    #[serde(default)]
    pub event_templates: BTreeMap<Stat, Vec<EventTemplate>>,
    pub tuning: Tuning,
}

impl Catalog {
    /// Parse a catalog from JSON without validating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a catalog.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn leader(&self, id: &str) -> Option<&Leader> {
        self.leaders.iter().find(|leader| leader.id == id)
    }

    #[must_use]
    pub fn member_template(&self, id: &str) -> Option<&MemberTemplate> {
        self.members.iter().find(|template| template.id == id)
    }

    #[must_use]
    pub fn members_of_rank(&self, rank: u8) -> Vec<&MemberTemplate> {
        self.members
            .iter()
            .filter(|template| template.rank == rank)
            .collect()
    }

    /// Leader-themed tactics followed by the generic catalog.
    #[must_use]
    pub fn tactics_for_leader(&self, leader: &Leader) -> Vec<&TacticTemplate> {
        self.tactic_pools
            .get(leader.tactic_pool_key())
            .into_iter()
            .flatten()
            .chain(self.tactics.iter())
            .collect()
    }

    #[must_use]
    pub fn event_pool(&self, stat: Stat) -> &[EventTemplate] {
        self.event_templates.get(&stat).map_or(&[], Vec::as_slice)
    }

    /// Effective magnitude of a gear template after tuning defaults.
    #[must_use]
    pub fn gear_value(&self, gear: &GearTemplate) -> i32 {
        match gear.kind {
            GearKind::ExtraSlot => 1,
            GearKind::Heal => gear.value.unwrap_or(self.tuning.heal_amount),
            GearKind::AutoSuccess => gear.value.unwrap_or(self.tuning.auto_success_margin),
        }
    }

    /// Effective magnitude of a tactic template after tuning defaults.
    #[must_use]
    pub fn tactic_value(&self, tactic: &TacticTemplate) -> i32 {
        match tactic.kind {
            TacticKind::PermanentBoost => tactic.value.unwrap_or(self.tuning.permanent_boost),
            TacticKind::NextSegmentBoost => {
                tactic.value.unwrap_or(self.tuning.next_segment_boost_pct)
            }
            TacticKind::SkipEvent => 0,
        }
    }

    /// Check the catalog for content mistakes that would otherwise surface
    /// mid-run.
    ///
    /// # Errors
    ///
    /// Returns [`FellowshipError::InvalidCatalog`] describing the first problem
    /// found, or [`FellowshipError::UnknownMemberTemplate`] for a dangling
    /// starting member.
    pub fn validate(&self) -> FellowshipResult<()> {
        if self.base_hp <= 0 {
            return Err(invalid(format!("base_hp must be positive (got {})", self.base_hp)));
        }
        if self.leaders.is_empty() {
            return Err(invalid("no leaders defined"));
        }
        ensure_unique("leader", self.leaders.iter().map(|l| l.id.as_str()))?;
        ensure_unique("member", self.members.iter().map(|m| m.id.as_str()))?;
        ensure_unique("gear", self.gear.iter().map(|g| g.id.as_str()))?;
        ensure_unique("tactic", self.tactics.iter().map(|t| t.id.as_str()))?;

        for leader in &self.leaders {
            if let Some(pool) = &leader.tactic_pool
                && !self.tactic_pools.contains_key(pool)
            {
                return Err(invalid(format!(
                    "leader '{}' references unknown tactic pool '{pool}'",
                    leader.id
                )));
            }
        }
        for template in &self.members {
            if !(1..=3).contains(&template.rank) {
                return Err(invalid(format!(
                    "member '{}' has rank {} outside 1..=3",
                    template.id, template.rank
                )));
            }
            if template.primary_stats.is_empty() {
                return Err(invalid(format!(
                    "member '{}' has no primary stats",
                    template.id
                )));
            }
        }
        for gear in &self.gear {
            if gear.kind == GearKind::AutoSuccess && gear.stat.is_none() {
                return Err(invalid(format!("auto-success gear '{}' names no stat", gear.id)));
            }
        }
        for tactic in self.tactics.iter().chain(self.tactic_pools.values().flatten()) {
            if tactic.kind != TacticKind::SkipEvent && tactic.stat.is_none() {
                return Err(invalid(format!("boost tactic '{}' names no stat", tactic.id)));
            }
        }
        for id in &self.starting_members {
            if self.member_template(id).is_none() {
                return Err(FellowshipError::UnknownMemberTemplate(id.clone()));
            }
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> FellowshipError {
    FellowshipError::InvalidCatalog(reason.into())
}

fn ensure_unique<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> FellowshipResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(invalid(format!("duplicate {kind} id '{id}'")));
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub(crate) fn member(id: &str, stats: &[Stat], rank: u8) -> MemberTemplate {
        MemberTemplate {
            id: id.to_string(),
            name: format!("{id} template"),
            desc: String::new(),
            primary_stats: stats.iter().copied().collect(),
            rank,
            base_value: 3,
            scaling: 2,
        }
    }

    pub(crate) fn gear(id: &str, kind: GearKind, stat: Option<Stat>) -> GearTemplate {
        GearTemplate {
            id: id.to_string(),
            name: format!("{id} gear"),
            desc: String::new(),
            kind,
            stat,
            value: None,
        }
    }

    pub(crate) fn tactic(id: &str, kind: TacticKind, stat: Option<Stat>) -> TacticTemplate {
        TacticTemplate {
            id: id.to_string(),
            name: format!("{id} tactic"),
            desc: String::new(),
            kind,
            stat,
            value: None,
        }
    }

    /// Small but complete catalog for unit tests.
    pub(crate) const fn tuning() -> Tuning {
        Tuning {
            heal_amount: 25,
            auto_success_margin: 10,
            permanent_boost: 2,
            next_segment_boost_pct: 30,
        }
    }

    pub(crate) fn catalog() -> Catalog {
        let event_templates = Stat::ALL
            .into_iter()
            .map(|stat| {
                let pool = (1..=2)
                    .map(|n| EventTemplate {
                        name: format!("{} trial {n}", stat.label()),
                        description: format!("A test of {stat}."),
                    })
                    .collect();
                (stat, pool)
            })
            .collect();
        let mut tactic_pools = BTreeMap::new();
        tactic_pools.insert(
            "warden".to_string(),
            vec![tactic("warden-drill", TacticKind::PermanentBoost, Some(Stat::Survival))],
        );
        Catalog {
            base_hp: 100,
            base_member_slots: 3,
            leaders: vec![
                Leader {
                    id: "warden".into(),
                    name: "The Warden".into(),
                    desc: String::new(),
                    base_stats: Stats::new(4, 5, 0, 1),
                    hp_bonus: 20,
                    tactic_pool: None,
                },
                Leader {
                    id: "bard".into(),
                    name: "The Bard".into(),
                    desc: String::new(),
                    base_stats: Stats::new(1, 1, 6, 3),
                    hp_bonus: 0,
                    tactic_pool: None,
                },
            ],
            members: vec![
                member("squire", &[Stat::Combat], 1),
                member("scout", &[Stat::Survival, Stat::Chaos], 1),
                member("knight", &[Stat::Combat, Stat::Survival], 2),
                member("envoy", &[Stat::Social], 2),
                member("archmage", &[Stat::Chaos], 3),
            ],
            gear: vec![
                gear("satchel", GearKind::ExtraSlot, None),
                gear("tonic", GearKind::Heal, None),
                gear("war-banner", GearKind::AutoSuccess, Some(Stat::Combat)),
            ],
            tactics: vec![
                tactic("drill", TacticKind::PermanentBoost, Some(Stat::Combat)),
                tactic("rally", TacticKind::NextSegmentBoost, Some(Stat::Social)),
                tactic("feint", TacticKind::SkipEvent, None),
            ],
            tactic_pools,
            starting_members: vec!["squire".into()],
            event_templates,
            tuning: tuning(),
        }
    }
}
