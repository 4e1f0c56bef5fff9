//! The four-stat vector every check is decided against.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Index, IndexMut};

/// One of the four fellowship stat tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Combat,
    Survival,
    Social,
    Chaos,
}

impl Stat {
    /// Every stat in canonical order.
    pub const ALL: [Self; 4] = [Self::Combat, Self::Survival, Self::Social, Self::Chaos];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Combat => "combat",
            Self::Survival => "survival",
            Self::Social => "social",
            Self::Chaos => "chaos",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Combat => "Combat",
            Self::Survival => "Survival",
            Self::Social => "Social",
            Self::Chaos => "Chaos",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Aggregated stat vector.
///
/// Missing fields deserialize as zero, so a leader's partial base-stat map
/// can be written with only the stats it actually grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub combat: i32,
    #[serde(default)]
    pub survival: i32,
    #[serde(default)]
    pub social: i32,
    #[serde(default)]
    pub chaos: i32,
}

impl Stats {
    #[must_use]
    pub const fn new(combat: i32, survival: i32, social: i32, chaos: i32) -> Self {
        Self {
            combat,
            survival,
            social,
            chaos,
        }
    }

    /// Sum of all four stats.
    #[must_use]
    pub const fn total(&self) -> i32 {
        self.combat + self.survival + self.social + self.chaos
    }

    /// The lowest stat, ties broken by canonical order.
    #[must_use]
    pub fn weakest(&self) -> Stat {
        Stat::ALL
            .into_iter()
            .min_by_key(|stat| self[*stat])
            .unwrap_or(Stat::Combat)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stat, i32)> + '_ {
        Stat::ALL.into_iter().map(|stat| (stat, self[stat]))
    }
}

impl Index<Stat> for Stats {
    type Output = i32;

    fn index(&self, stat: Stat) -> &Self::Output {
        match stat {
            Stat::Combat => &self.combat,
            Stat::Survival => &self.survival,
            Stat::Social => &self.social,
            Stat::Chaos => &self.chaos,
        }
    }
}

impl IndexMut<Stat> for Stats {
    fn index_mut(&mut self, stat: Stat) -> &mut Self::Output {
        match stat {
            Stat::Combat => &mut self.combat,
            Stat::Survival => &mut self.survival,
            Stat::Social => &mut self.social,
            Stat::Chaos => &mut self.chaos,
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CMB {} | SRV {} | SOC {} | CHS {}",
            self.combat, self.survival, self.social, self.chaos
        )
    }
}

/// Percentage boosts for one segment, keyed by stat. Percentages for the
/// same stat are summed before the single scaling step.
pub type TempBoosts = BTreeMap<Stat, i32>;
