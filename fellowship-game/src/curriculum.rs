//! Ten-segment curriculum generation.
//!
//! Draw order per segment: one float for the single/dual roll, one pick for
//! the stat (or pair), then per event an optional check-type pick (dual
//! segments only) followed by one flavor pick.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::catalog::Catalog;
use crate::constants::{
    BASE_THRESHOLD, DUAL_STAT_POOL, EARLY_SINGLE_CHANCE, EARLY_TIER_LAST_SEGMENT,
    EVENTS_PER_SEGMENT, FAILURE_DAMAGE_BASE, LATE_SINGLE_CHANCE, MID_SINGLE_CHANCE,
    MID_TIER_LAST_SEGMENT, MITIGATED_DAMAGE_BASE, MITIGATED_DAMAGE_FACTOR, SEGMENT_COUNT,
    SINGLE_STAT_POOL, THRESHOLD_SEGMENT_FACTOR,
};
use crate::error::FellowshipResult;
use crate::numbers::{floor_f64_to_i32, u32_to_i32};
use crate::rng::DeterministicRng;
use crate::stats::Stat;

/// Stat focus of a whole segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentType {
    Single { stat: Stat },
    Dual { first: Stat, second: Stat },
}

impl fmt::Display for SegmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single { stat } => f.write_str(stat.label()),
            Self::Dual { first, second } => write!(f, "{} + {}", first.label(), second.label()),
        }
    }
}

/// Which stats an event checks. A dual check passes only when both stats
/// pass independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckType {
    Single { stat: Stat },
    Dual { first: Stat, second: Stat },
}

impl CheckType {
    #[must_use]
    pub fn stats(self) -> SmallVec<[Stat; 2]> {
        match self {
            Self::Single { stat } => SmallVec::from_slice(&[stat]),
            Self::Dual { first, second } => SmallVec::from_slice(&[first, second]),
        }
    }

    /// Stat used to choose flavor text.
    #[must_use]
    pub const fn primary(self) -> Stat {
        match self {
            Self::Single { stat } => stat,
            Self::Dual { first, .. } => first,
        }
    }
}

impl fmt::Display for CheckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single { stat } => f.write_str(stat.label()),
            Self::Dual { first, second } => write!(f, "{}+{}", first.label(), second.label()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatThreshold {
    pub stat: Stat,
    pub value: i32,
}

/// Damage dealt per outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageTable {
    pub success: i32,
    pub mitigated: i32,
    pub failure: i32,
}

impl DamageTable {
    #[must_use]
    pub fn for_segment(index: u32) -> Self {
        let index_f = f64::from(index);
        Self {
            success: 0,
            mitigated: MITIGATED_DAMAGE_BASE + floor_f64_to_i32(index_f * MITIGATED_DAMAGE_FACTOR),
            failure: FAILURE_DAMAGE_BASE + u32_to_i32(index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub check: CheckType,
    pub thresholds: SmallVec<[StatThreshold; 2]>,
    pub damage: DamageTable,
}

impl EventDefinition {
    #[must_use]
    pub fn threshold_for(&self, stat: Stat) -> Option<i32> {
        self.thresholds
            .iter()
            .find(|entry| entry.stat == stat)
            .map(|entry| entry.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentDefinition {
    pub index: u32,
    pub segment_type: SegmentType,
    pub events: Vec<EventDefinition>,
}

/// Check threshold for an event at `position` (0-based) in segment `index`.
#[must_use]
pub fn event_threshold(position: u32, index: u32) -> i32 {
    BASE_THRESHOLD
        + u32_to_i32(position)
        + floor_f64_to_i32(f64::from(index) * THRESHOLD_SEGMENT_FACTOR)
}

/// Chance that segment `index` focuses a single stat.
#[must_use]
pub fn single_stat_chance(index: u32) -> f64 {
    if index <= EARLY_TIER_LAST_SEGMENT {
        EARLY_SINGLE_CHANCE
    } else if index <= MID_TIER_LAST_SEGMENT {
        MID_SINGLE_CHANCE
    } else {
        LATE_SINGLE_CHANCE
    }
}

/// Generate the full curriculum for a run.
///
/// # Errors
///
/// Returns [`crate::FellowshipError::EmptyInput`] when the catalog has no
/// flavor templates for a stat that an event needs.
pub fn generate_segments(
    catalog: &Catalog,
    rng: &mut DeterministicRng,
) -> FellowshipResult<Vec<SegmentDefinition>> {
    (1..=SEGMENT_COUNT)
        .map(|index| generate_segment(catalog, index, rng))
        .collect()
}

fn generate_segment(
    catalog: &Catalog,
    index: u32,
    rng: &mut DeterministicRng,
) -> FellowshipResult<SegmentDefinition> {
    let single = rng.next_float() < single_stat_chance(index);
    let segment_type = if single {
        let stat = *rng.pick(&SINGLE_STAT_POOL, "single-stat segment types")?;
        SegmentType::Single { stat }
    } else {
        let (first, second) = *rng.pick(&DUAL_STAT_POOL, "dual-stat segment types")?;
        SegmentType::Dual { first, second }
    };

    let events = (0..EVENTS_PER_SEGMENT)
        .map(|position| generate_event(catalog, index, position, segment_type, rng))
        .collect::<FellowshipResult<Vec<_>>>()?;

    log::debug!("segment {index} generated as {segment_type}");
    Ok(SegmentDefinition {
        index,
        segment_type,
        events,
    })
}

fn generate_event(
    catalog: &Catalog,
    index: u32,
    position: u32,
    segment_type: SegmentType,
    rng: &mut DeterministicRng,
) -> FellowshipResult<EventDefinition> {
    let check = match segment_type {
        SegmentType::Single { stat } => CheckType::Single { stat },
        SegmentType::Dual { first, second } => *rng.pick(
            &[
                CheckType::Single { stat: first },
                CheckType::Single { stat: second },
                CheckType::Dual { first, second },
            ],
            "dual-segment check types",
        )?,
    };
    let primary = check.primary();
    let flavor = rng.pick(
        catalog.event_pool(primary),
        &format!("{primary} event templates"),
    )?;
    let threshold = event_threshold(position, index);

    Ok(EventDefinition {
        id: format!("s{index}-e{}", position + 1),
        name: flavor.name.clone(),
        description: flavor.description.clone(),
        check,
        thresholds: check
            .stats()
            .into_iter()
            .map(|stat| StatThreshold {
                stat,
                value: threshold,
            })
            .collect(),
        damage: DamageTable::for_segment(index),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;
    use crate::rng::Seed;

    #[test]
    fn threshold_and_damage_follow_curve() {
        assert_eq!(event_threshold(0, 1), 3);
        assert_eq!(event_threshold(2, 1), 5);
        assert_eq!(event_threshold(0, 5), 5);
        assert_eq!(event_threshold(2, 10), 10);

        let first = DamageTable::for_segment(1);
        assert_eq!((first.success, first.mitigated, first.failure), (0, 3, 8));
        let fifth = DamageTable::for_segment(5);
        assert_eq!((fifth.mitigated, fifth.failure), (5, 12));
        let last = DamageTable::for_segment(10);
        assert_eq!((last.mitigated, last.failure), (7, 17));
    }

    #[test]
    fn single_chance_tiers() {
        assert!((single_stat_chance(1) - 0.8).abs() < f64::EPSILON);
        assert!((single_stat_chance(4) - 0.8).abs() < f64::EPSILON);
        assert!((single_stat_chance(5) - 0.5).abs() < f64::EPSILON);
        assert!((single_stat_chance(7) - 0.5).abs() < f64::EPSILON);
        assert!((single_stat_chance(8) - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn curriculum_has_ten_segments_of_three_events() {
        let catalog = fixtures::catalog();
        let mut rng = DeterministicRng::new(&Seed::from("curriculum"));
        let segments = generate_segments(&catalog, &mut rng).unwrap();
        assert_eq!(segments.len(), 10);
        for (offset, segment) in segments.iter().enumerate() {
            assert_eq!(segment.index as usize, offset + 1);
            assert_eq!(segment.events.len(), 3);
            for (position, event) in segment.events.iter().enumerate() {
                let expected = event_threshold(u32::try_from(position).unwrap(), segment.index);
                for stat in event.check.stats() {
                    assert_eq!(event.threshold_for(stat), Some(expected));
                }
                match (segment.segment_type, event.check) {
                    (SegmentType::Single { stat }, check) => {
                        assert_eq!(check, CheckType::Single { stat });
                    }
                    (SegmentType::Dual { first, second }, check) => {
                        assert!(check.stats().iter().all(|s| *s == first || *s == second));
                    }
                }
            }
        }
    }

    #[test]
    fn curriculum_is_reproducible() {
        let catalog = fixtures::catalog();
        let seed = Seed::Number(2024);
        let a = generate_segments(&catalog, &mut DeterministicRng::new(&seed)).unwrap();
        let b = generate_segments(&catalog, &mut DeterministicRng::new(&seed)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_flavor_pool_is_an_error() {
        let mut catalog = fixtures::catalog();
        catalog.event_templates.clear();
        let mut rng = DeterministicRng::new(&Seed::Number(1));
        let err = generate_segments(&catalog, &mut rng).unwrap_err();
        assert!(matches!(err, crate::FellowshipError::EmptyInput { .. }));
    }
}
