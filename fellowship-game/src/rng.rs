//! Seeded linear-congruential random source.
//!
//! Every random decision in a run flows through one [`DeterministicRng`]
//! threaded explicitly by the caller. The arithmetic is exact integer math,
//! so a seed yields the same draw sequence on every platform.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FellowshipError, FellowshipResult};
use crate::numbers::{floor_f64_to_usize, usize_to_f64};

const LCG_MULTIPLIER: u64 = 1_103_515_245;
const LCG_INCREMENT: u64 = 12_345;
const LCG_MASK: u64 = 0x7FFF_FFFF;
const LCG_MODULUS: f64 = 2_147_483_648.0;
const SEED_REDUCTION: u64 = 2_147_483_647;

/// A run seed, as typed by a player or generated by a batch runner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seed {
    Number(i64),
    Text(String),
}

impl Seed {
    /// Starting LCG state: strings are hashed, then both forms are reduced
    /// to `1..2^31-1`.
    #[must_use]
    pub fn initial_state(&self) -> u64 {
        let raw = match self {
            Self::Number(value) => value.unsigned_abs(),
            Self::Text(text) => i64::from(hash_text(text)).unsigned_abs(),
        };
        match raw % SEED_REDUCTION {
            0 => 1,
            state => state,
        }
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for Seed {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Seed {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Seed {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for Seed {
    fn from(value: u32) -> Self {
        Self::Number(i64::from(value))
    }
}

/// 32-bit rolling hash (`h * 31 + unit`) over UTF-16 code units.
fn hash_text(text: &str) -> i32 {
    text.encode_utf16().fold(0_i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

/// Deterministic random source for a single run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    #[must_use]
    pub fn new(seed: &Seed) -> Self {
        Self {
            state: seed.initial_state(),
        }
    }

    /// Current internal state, useful for asserting draw positions in tests.
    #[must_use]
    pub const fn state(&self) -> u64 {
        self.state
    }

    /// Next value in `[0, 1)`.
    pub fn next_float(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT)
            & LCG_MASK;
        let state = u32::try_from(self.state).unwrap_or(u32::MAX);
        f64::from(state) / LCG_MODULUS
    }

    /// Inclusive integer in `min..=max`.
    #[allow(clippy::cast_precision_loss)]
    pub fn next_int(&mut self, min: i64, max: i64) -> i64 {
        let span = max.saturating_sub(min).saturating_add(1).max(1);
        let offset = floor_f64_to_usize(self.next_float() * span as f64);
        min.saturating_add(i64::try_from(offset).unwrap_or(0))
    }

    /// Inclusive index in `0..=max`.
    fn next_index(&mut self, max: usize) -> usize {
        let offset = floor_f64_to_usize(self.next_float() * usize_to_f64(max + 1));
        offset.min(max)
    }

    /// Returns a Fisher-Yates shuffled copy; the input is left untouched.
    pub fn shuffle<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        let mut shuffled = items.to_vec();
        for i in (1..shuffled.len()).rev() {
            let j = self.next_index(i);
            shuffled.swap(i, j);
        }
        shuffled
    }

    /// Uniformly pick one element.
    ///
    /// # Errors
    ///
    /// Returns [`FellowshipError::EmptyInput`] when `items` is empty; `what`
    /// names the candidate list for the error message.
    pub fn pick<'a, T>(&mut self, items: &'a [T], what: &str) -> FellowshipResult<&'a T> {
        let Some(max) = items.len().checked_sub(1) else {
            return Err(FellowshipError::empty_input(what));
        };
        let index = self.next_index(max);
        items
            .get(index)
            .ok_or_else(|| FellowshipError::empty_input(what))
    }
}
