//! Single-event check resolution.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt::Write as _;

use crate::constants::{MARKER_FAILURE, MARKER_MITIGATED, MARKER_SKIPPED, MARKER_SUCCESS};
use crate::curriculum::EventDefinition;
use crate::state::RunState;
use crate::stats::{Stat, Stats};

/// Overall result of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    MitigatedFailure,
    Failure,
}

impl Outcome {
    /// Transcript marker for this outcome.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Success => MARKER_SUCCESS,
            Self::MitigatedFailure => MARKER_MITIGATED,
            Self::Failure => MARKER_FAILURE,
        }
    }
}

/// Comparison of one stat against its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckResult {
    Pass,
    Tie,
    Fail,
}

impl CheckResult {
    #[must_use]
    pub const fn compare(value: i32, threshold: i32) -> Self {
        if value > threshold {
            Self::Pass
        } else if value == threshold {
            Self::Tie
        } else {
            Self::Fail
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCheck {
    pub stat: Stat,
    pub value: i32,
    pub threshold: i32,
    pub result: CheckResult,
    /// An auto-success token was spent on this check.
    pub forced: bool,
}

/// Result of resolving one event. HP is untouched; the caller applies damage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventResolution {
    /// State after consuming the skip flag or any auto-success tokens.
    pub state: RunState,
    pub outcome: Outcome,
    pub damage: i32,
    pub checks: SmallVec<[StatCheck; 2]>,
    pub skipped: bool,
    /// Transcript line, also appended to the state's event log.
    pub line: String,
}

/// Combine per-stat results: any fail fails, else any tie mitigates.
#[must_use]
pub fn combine_checks(checks: &[StatCheck]) -> Outcome {
    if checks.iter().any(|check| check.result == CheckResult::Fail) {
        Outcome::Failure
    } else if checks.iter().any(|check| check.result == CheckResult::Tie) {
        Outcome::MitigatedFailure
    } else {
        Outcome::Success
    }
}

/// Resolve `event` against `stats`.
///
/// A pending skip is consumed first and yields a free success. Otherwise each
/// checked stat may spend one unused auto-success token for that stat, which
/// lifts its value to the threshold plus the token's margin.
#[must_use]
pub fn resolve_event(state: &RunState, event: &EventDefinition, stats: &Stats) -> EventResolution {
    let mut next = state.clone();

    if next.skip_next_event {
        next.skip_next_event = false;
        let line = format!("{MARKER_SKIPPED} {} - bypassed, no damage", event.name);
        next.record(line.clone());
        log::debug!("event {} skipped", event.id);
        return EventResolution {
            state: next,
            outcome: Outcome::Success,
            damage: 0,
            checks: SmallVec::new(),
            skipped: true,
            line,
        };
    }

    let mut checks: SmallVec<[StatCheck; 2]> = SmallVec::new();
    for stat in event.check.stats() {
        let threshold = event.threshold_for(stat).unwrap_or_default();
        let mut value = stats[stat];
        let mut forced = false;
        if let Some(token) = next.unused_gear_for_mut(stat) {
            token.used = true;
            value = threshold + token.value;
            forced = true;
            log::trace!("event {} spends {} on {stat}", event.id, token.id);
        }
        checks.push(StatCheck {
            stat,
            value,
            threshold,
            result: CheckResult::compare(value, threshold),
            forced,
        });
    }

    let outcome = combine_checks(&checks);
    let damage = match outcome {
        Outcome::Success => event.damage.success,
        Outcome::MitigatedFailure => event.damage.mitigated,
        Outcome::Failure => event.damage.failure,
    };
    let line = describe(event, outcome, damage, &checks);
    next.record(line.clone());
    log::trace!("event {} resolved {outcome:?} for {damage} damage", event.id);

    EventResolution {
        state: next,
        outcome,
        damage,
        checks,
        skipped: false,
        line,
    }
}

fn describe(event: &EventDefinition, outcome: Outcome, damage: i32, checks: &[StatCheck]) -> String {
    let mut line = format!("{} {} (", outcome.marker(), event.name);
    for (position, check) in checks.iter().enumerate() {
        if position > 0 {
            line.push_str(", ");
        }
        let _ = write!(
            line,
            "{} {} vs {}",
            check.stat.label(),
            check.value,
            check.threshold
        );
        if check.forced {
            line.push_str(" [auto]");
        }
    }
    line.push(')');
    if damage > 0 {
        let _ = write!(line, " - {damage} damage");
    } else {
        line.push_str(" - no damage");
    }
    line
}
