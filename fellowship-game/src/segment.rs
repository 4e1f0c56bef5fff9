//! Segment simulation: three events, damage, level-ups and boost expiry.
use serde::{Deserialize, Serialize};

use crate::aggregate::{active_temp_boosts, compute_stats};
use crate::constants::{
    LEVEL_UP_SUCCESSES, MARKER_FAILURE, MARKER_MITIGATED, MARKER_SKIPPED, MARKER_SUCCESS,
};
use crate::error::{FellowshipError, FellowshipResult};
use crate::resolver::{Outcome, resolve_event};
use crate::state::{RunState, is_run_over};

/// Per-outcome event counts. Skipped events also count as successes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutcomeTally {
    pub successes: u32,
    pub mitigated: u32,
    pub failures: u32,
    pub skipped: u32,
}

impl OutcomeTally {
    pub fn record(&mut self, outcome: Outcome, skipped: bool) {
        match outcome {
            Outcome::Success => self.successes += 1,
            Outcome::MitigatedFailure => self.mitigated += 1,
            Outcome::Failure => self.failures += 1,
        }
        if skipped {
            self.skipped += 1;
        }
    }

    #[must_use]
    pub const fn events(&self) -> u32 {
        self.successes + self.mitigated + self.failures
    }

    pub fn absorb(&mut self, other: &Self) {
        self.successes += other.successes;
        self.mitigated += other.mitigated;
        self.failures += other.failures;
        self.skipped += other.skipped;
    }
}

/// Count outcome markers in transcript lines.
///
/// This is the parsing contract for transcript consumers: each outcome kind
/// has a distinct bracketed marker at the start of its line.
#[must_use]
pub fn count_outcome_markers<S: AsRef<str>>(lines: &[S]) -> OutcomeTally {
    let mut tally = OutcomeTally::default();
    for line in lines {
        let line = line.as_ref().trim_start();
        if line.starts_with(MARKER_SUCCESS) {
            tally.record(Outcome::Success, false);
        } else if line.starts_with(MARKER_SKIPPED) {
            tally.record(Outcome::Success, true);
        } else if line.starts_with(MARKER_MITIGATED) {
            tally.record(Outcome::MitigatedFailure, false);
        } else if line.starts_with(MARKER_FAILURE) {
            tally.record(Outcome::Failure, false);
        }
    }
    tally
}

/// Everything produced by playing one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentOutcome {
    pub state: RunState,
    /// Human-readable transcript for this segment only.
    pub log: Vec<String>,
    pub segment_index: u32,
    pub tally: OutcomeTally,
    pub damage_taken: i32,
    pub levelled_up: bool,
    pub fell: bool,
}

/// Play the current segment.
///
/// Stats are computed once, with that segment's temporary boosts, before the
/// first event, and the returned state keeps that vector. HP is floored at
/// zero after every event and the segment stops the moment it reaches zero; a
/// fallen segment neither levels members nor advances the segment index.
/// Playing a finished run returns it unchanged.
///
/// # Errors
///
/// Returns [`FellowshipError::MissingSegment`] when a live run has no
/// curriculum entry for its current segment index.
pub fn simulate_segment(state: &RunState) -> FellowshipResult<SegmentOutcome> {
    let mut next = state.clone();
    let index = next.segment_index;
    let mut outcome = SegmentOutcome {
        state: state.clone(),
        log: Vec::new(),
        segment_index: index,
        tally: OutcomeTally::default(),
        damage_taken: 0,
        levelled_up: false,
        fell: state.hp <= 0,
    };
    if is_run_over(state) {
        return Ok(outcome);
    }
    let segment = state
        .current_segment()
        .ok_or(FellowshipError::MissingSegment(index))?;

    let boosts = active_temp_boosts(&next);
    let stats = compute_stats(&next, Some(&boosts));
    next.stats = stats;

    let mut lines = vec![format!(
        "=== Segment {index}: {} trials ===",
        segment.segment_type
    )];
    if !boosts.is_empty() {
        let active: Vec<String> = boosts
            .iter()
            .map(|(stat, pct)| format!("{} +{pct}%", stat.label()))
            .collect();
        lines.push(format!("Tactics active: {}", active.join(", ")));
    }
    lines.push(format!("Fellowship stands at {stats}."));
    for line in &lines {
        next.record(line.clone());
    }

    for event in &segment.events {
        let resolution = resolve_event(&next, event, &stats);
        next = resolution.state;
        lines.push(resolution.line);
        outcome.tally.record(resolution.outcome, resolution.skipped);
        outcome.damage_taken += resolution.damage;
        next.hp = next.hp.saturating_sub(resolution.damage).max(0);

        if next.hp <= 0 {
            let line = format!("The fellowship has fallen during segment {index}.");
            next.record(line.clone());
            lines.push(line);
            log::debug!("run ended in segment {index}");
            outcome.state = next;
            outcome.log = lines;
            outcome.fell = true;
            return Ok(outcome);
        }
    }

    if outcome.tally.successes >= LEVEL_UP_SUCCESSES {
        for member in &mut next.members {
            member.level += 1;
        }
        outcome.levelled_up = true;
        if !next.members.is_empty() {
            let line = "Every companion grows stronger. (+1 level)".to_string();
            next.record(line.clone());
            lines.push(line);
        }
    }

    for tactic in &mut next.tactics {
        if tactic.is_active_for(index) {
            tactic.used = true;
        }
    }
    next.segment_index += 1;

    let tally = outcome.tally;
    let line = format!(
        "Segment {index} cleared: {} succeeded, {} mitigated, {} failed. HP {}/{}.",
        tally.successes, tally.mitigated, tally.failures, next.hp, next.max_hp
    );
    next.record(line.clone());
    lines.push(line);
    log::debug!(
        "segment {index} survived with {} successes, hp {}",
        tally.successes,
        next.hp
    );

    outcome.state = next;
    outcome.log = lines;
    Ok(outcome)
}
