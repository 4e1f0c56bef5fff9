use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use fellowship_game::{DraftOption, DraftPayload, GearKind, RunState, Seed, TacticKind};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;

/// Decision returned by a [`DraftPolicy`]. `choice` is the 1-based draft
/// index; `0` skips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub choice: usize,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn new(choice: usize, rationale: impl Into<String>) -> Self {
        Self {
            choice,
            rationale: Some(rationale.into()),
        }
    }
}

/// Policy interface for automated drafting.
pub trait DraftPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Select one of the offered options for the current draft.
    fn pick_option(&mut self, state: &RunState, options: &[DraftOption]) -> PolicyDecision;
}

/// Built-in strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameplayStrategy {
    FirstPick,
    Skip,
    Greedy,
    Balanced,
    Random,
}

impl GameplayStrategy {
    pub const ALL: [Self; 5] = [
        Self::FirstPick,
        Self::Skip,
        Self::Greedy,
        Self::Balanced,
        Self::Random,
    ];

    /// Key accepted on the command line.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::FirstPick => "first-pick",
            Self::Skip => "skip",
            Self::Greedy => "greedy",
            Self::Balanced => "balanced",
            Self::Random => "random",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FirstPick => "First Pick",
            Self::Skip => "Skip Everything",
            Self::Greedy => "Greedy",
            Self::Balanced => "Balanced",
            Self::Random => "Random",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::FirstPick => "always takes the member option",
            Self::Skip => "never drafts anything",
            Self::Greedy => "recruits while slots are free, heals when low, otherwise takes the tactic",
            Self::Balanced => "shores up the fellowship's weakest stat",
            Self::Random => "uniform pick seeded from the run seed",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: &Seed) -> Box<dyn DraftPolicy + Send> {
        match self {
            Self::FirstPick => Box::new(FirstPickPolicy),
            Self::Skip => Box::new(SkipPolicy),
            Self::Greedy => Box::new(GreedyPolicy),
            Self::Balanced => Box::new(BalancedPolicy),
            Self::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GameplayStrategy {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let key = raw.trim().to_ascii_lowercase().replace('_', "-");
        match Self::ALL.into_iter().find(|strategy| strategy.key() == key) {
            Some(strategy) => Ok(strategy),
            None => bail!("Unknown strategy: {raw}"),
        }
    }
}

struct FirstPickPolicy;
struct SkipPolicy;
struct GreedyPolicy;
struct BalancedPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: &Seed) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed.initial_state()),
        }
    }
}

impl DraftPolicy for FirstPickPolicy {
    fn name(&self) -> &'static str {
        "First Pick"
    }

    fn pick_option(&mut self, _state: &RunState, _options: &[DraftOption]) -> PolicyDecision {
        PolicyDecision::new(1, "first option")
    }
}

impl DraftPolicy for SkipPolicy {
    fn name(&self) -> &'static str {
        "Skip Everything"
    }

    fn pick_option(&mut self, _state: &RunState, _options: &[DraftOption]) -> PolicyDecision {
        PolicyDecision::new(0, "skip")
    }
}

impl DraftPolicy for GreedyPolicy {
    fn name(&self) -> &'static str {
        "Greedy"
    }

    fn pick_option(&mut self, state: &RunState, options: &[DraftOption]) -> PolicyDecision {
        if state.has_free_slot() && position_of(options, is_member).is_some() {
            return PolicyDecision::new(choice_of(options, is_member), "recruit into free slot");
        }
        if is_low_hp(state) && position_of(options, is_heal).is_some() {
            return PolicyDecision::new(choice_of(options, is_heal), "heal while low");
        }
        if position_of(options, is_tactic).is_some() {
            return PolicyDecision::new(choice_of(options, is_tactic), "take the tactic");
        }
        PolicyDecision::new(1, "fallback")
    }
}

impl DraftPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn pick_option(&mut self, state: &RunState, options: &[DraftOption]) -> PolicyDecision {
        if is_low_hp(state) && position_of(options, is_heal).is_some() {
            return PolicyDecision::new(choice_of(options, is_heal), "heal while low");
        }
        let weakest = state.stats.weakest();
        let best = options
            .iter()
            .enumerate()
            .map(|(index, option)| (index, weakness_score(state, option, weakest)))
            .max_by_key(|(index, score)| (*score, std::cmp::Reverse(*index)));
        match best {
            Some((index, score)) if score > 0 => {
                PolicyDecision::new(index + 1, format!("targets {weakest} (score {score})"))
            }
            _ => PolicyDecision::new(0, format!("nothing helps {weakest}")),
        }
    }
}

impl DraftPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn pick_option(&mut self, _state: &RunState, options: &[DraftOption]) -> PolicyDecision {
        if options.is_empty() {
            return PolicyDecision::new(0, "no options");
        }
        let choice = self.rng.gen_range(1..=options.len());
        PolicyDecision::new(choice, "random")
    }
}

fn is_low_hp(state: &RunState) -> bool {
    state.hp.saturating_mul(2) < state.max_hp
}

const fn is_member(option: &DraftOption) -> bool {
    matches!(option.payload, DraftPayload::Member(_))
}

fn is_heal(option: &DraftOption) -> bool {
    matches!(&option.payload, DraftPayload::Gear { template, .. } if template.kind == GearKind::Heal)
}

const fn is_tactic(option: &DraftOption) -> bool {
    matches!(option.payload, DraftPayload::Tactic { .. })
}

fn position_of(options: &[DraftOption], predicate: impl Fn(&DraftOption) -> bool) -> Option<usize> {
    options.iter().position(predicate)
}

fn choice_of(options: &[DraftOption], predicate: impl Fn(&DraftOption) -> bool) -> usize {
    position_of(options, predicate).map_or(0, |index| index + 1)
}

/// How much an option helps the weakest stat; zero means not at all.
fn weakness_score(state: &RunState, option: &DraftOption, weakest: fellowship_game::Stat) -> i32 {
    match &option.payload {
        DraftPayload::Member(template) if template.primary_stats.contains(&weakest) => {
            if state.has_free_slot() {
                template.base_value * 2
            } else {
                template.scaling * 2
            }
        }
        DraftPayload::Member(_) => 0,
        DraftPayload::Gear { template, .. } => match template.kind {
            GearKind::AutoSuccess if template.stat == Some(weakest) => 3,
            GearKind::ExtraSlot if !state.has_free_slot() => 1,
            _ => 0,
        },
        DraftPayload::Tactic { template, value } => match template.kind {
            TacticKind::PermanentBoost if template.stat == Some(weakest) => value * 2,
            TacticKind::NextSegmentBoost if template.stat == Some(weakest) => {
                state.stats[weakest].max(0) * value / 100
            }
            TacticKind::SkipEvent => 1,
            _ => 0,
        },
    }
}
