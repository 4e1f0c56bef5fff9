//! Centralized curriculum math and transcript markers.
//!
//! Content balance lives in the catalog's tuning block. The values here are
//! the fixed difficulty curve of the ten-segment arc.

use crate::stats::Stat;

// Run shape ----------------------------------------------------------------
pub const SEGMENT_COUNT: u32 = 10;
pub const EVENTS_PER_SEGMENT: u32 = 3;
/// Successful events needed in a survived segment to level every member.
pub const LEVEL_UP_SUCCESSES: u32 = 2;

// Segment type bias --------------------------------------------------------
pub const EARLY_TIER_LAST_SEGMENT: u32 = 4;
pub const MID_TIER_LAST_SEGMENT: u32 = 7;
pub const EARLY_SINGLE_CHANCE: f64 = 0.8;
pub const MID_SINGLE_CHANCE: f64 = 0.5;
pub const LATE_SINGLE_CHANCE: f64 = 0.2;

pub const SINGLE_STAT_POOL: [Stat; 4] = Stat::ALL;
pub const DUAL_STAT_POOL: [(Stat, Stat); 6] = [
    (Stat::Combat, Stat::Survival),
    (Stat::Combat, Stat::Social),
    (Stat::Combat, Stat::Chaos),
    (Stat::Survival, Stat::Social),
    (Stat::Survival, Stat::Chaos),
    (Stat::Social, Stat::Chaos),
];

// Thresholds and damage ----------------------------------------------------
pub const BASE_THRESHOLD: i32 = 3;
pub const THRESHOLD_SEGMENT_FACTOR: f64 = 0.5;
pub const MITIGATED_DAMAGE_BASE: i32 = 3;
pub const MITIGATED_DAMAGE_FACTOR: f64 = 0.4;
pub const FAILURE_DAMAGE_BASE: i32 = 7;

// Draft rank tiers ---------------------------------------------------------
pub const RANK_ONE_LAST_SEGMENT: u32 = 3;
pub const RANK_TWO_LAST_SEGMENT: u32 = 6;

// Scoring ------------------------------------------------------------------
pub const SCORE_PER_SEGMENT: i64 = 100;
pub const SCORE_PER_HP: i64 = 2;
pub const SCORE_PER_LEVEL: i64 = 5;
pub const VICTORY_BONUS: i64 = 500;

// Transcript markers -------------------------------------------------------
pub const MARKER_SUCCESS: &str = "[SUCCESS]";
pub const MARKER_MITIGATED: &str = "[MITIGATED]";
pub const MARKER_FAILURE: &str = "[FAILURE]";
pub const MARKER_SKIPPED: &str = "[SKIPPED]";
