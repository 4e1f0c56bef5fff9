//! Run sessions: one run state, its RNG and a per-segment history.
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::draft::{DraftOption, apply_draft_choice, get_draft_options};
use crate::error::FellowshipResult;
use crate::result::{RunSummary, summarize_run};
use crate::rng::{DeterministicRng, Seed};
use crate::segment::{OutcomeTally, SegmentOutcome, simulate_segment};
use crate::state::{RunState, create_run, is_run_over};

/// Per-segment record kept by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub index: u32,
    pub tally: OutcomeTally,
    pub damage_taken: i32,
    pub levelled_up: bool,
    pub fell: bool,
    pub hp_after: i32,
}

/// Draft decision recorded by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRecord {
    pub after_segment: u32,
    pub choice: usize,
    pub description: Option<String>,
}

/// High-level session binding a run state to its RNG and catalog.
///
/// Both the interactive front-end and the bot runner drive runs through this
/// type, so they consume draws in the same order.
#[derive(Debug, Clone)]
pub struct RunSession<'c> {
    catalog: &'c Catalog,
    state: RunState,
    rng: DeterministicRng,
    pending: Option<[DraftOption; 3]>,
    segments: Vec<SegmentRecord>,
    drafts: Vec<DraftRecord>,
}

impl<'c> RunSession<'c> {
    /// Start a fresh run.
    ///
    /// # Errors
    ///
    /// Propagates [`create_run`] errors.
    pub fn new(catalog: &'c Catalog, leader_id: &str, seed: impl Into<Seed>) -> FellowshipResult<Self> {
        let (state, rng) = create_run(catalog, leader_id, seed)?;
        Ok(Self::from_parts(catalog, state, rng))
    }

    /// Resume from an existing state and the RNG that produced it.
    #[must_use]
    pub const fn from_parts(catalog: &'c Catalog, state: RunState, rng: DeterministicRng) -> Self {
        Self {
            catalog,
            state,
            rng,
            pending: None,
            segments: Vec::new(),
            drafts: Vec::new(),
        }
    }

    /// Play the current segment, returning its transcript and tallies.
    ///
    /// # Errors
    ///
    /// Propagates [`simulate_segment`] errors.
    pub fn play_segment(&mut self) -> FellowshipResult<SegmentOutcome> {
        let outcome = simulate_segment(&self.state)?;
        if !outcome.log.is_empty() {
            self.segments.push(SegmentRecord {
                index: outcome.segment_index,
                tally: outcome.tally,
                damage_taken: outcome.damage_taken,
                levelled_up: outcome.levelled_up,
                fell: outcome.fell,
                hp_after: outcome.state.hp,
            });
        }
        self.state = outcome.state.clone();
        self.pending = None;
        Ok(outcome)
    }

    /// Options for the current draft. Repeated calls return the same three
    /// options without drawing again.
    ///
    /// # Errors
    ///
    /// Propagates [`get_draft_options`] errors.
    pub fn draft_options(&mut self) -> FellowshipResult<&[DraftOption; 3]> {
        let options = match self.pending.take() {
            Some(options) => options,
            None => get_draft_options(&self.state, self.catalog, &mut self.rng)?,
        };
        Ok(self.pending.insert(options))
    }

    /// Apply a 1-based choice from the current draft; 0 skips.
    ///
    /// # Errors
    ///
    /// Propagates [`get_draft_options`] and [`apply_draft_choice`] errors.
    pub fn choose(&mut self, choice: usize) -> FellowshipResult<()> {
        let options = match self.pending.take() {
            Some(options) => options,
            None => get_draft_options(&self.state, self.catalog, &mut self.rng)?,
        };
        self.state = apply_draft_choice(&self.state, choice, &options, &mut self.rng)?;
        self.drafts.push(DraftRecord {
            after_segment: self.state.segments_cleared(),
            choice,
            description: choice
                .checked_sub(1)
                .and_then(|index| options.get(index))
                .map(|option| option.description.clone()),
        });
        Ok(())
    }

    /// Drive the run to completion, asking `chooser` for every draft pick.
    ///
    /// # Errors
    ///
    /// Propagates segment and draft errors.
    pub fn play_to_end(
        &mut self,
        mut chooser: impl FnMut(&RunState, &[DraftOption]) -> usize,
    ) -> FellowshipResult<RunSummary> {
        while !self.is_over() {
            self.play_segment()?;
            if self.is_over() {
                break;
            }
            let options = self.draft_options()?.clone();
            let choice = chooser(&self.state, &options);
            self.choose(choice)?;
        }
        Ok(self.summary())
    }

    #[must_use]
    pub const fn is_over(&self) -> bool {
        is_run_over(&self.state)
    }

    #[must_use]
    pub fn summary(&self) -> RunSummary {
        summarize_run(&self.state)
    }

    #[must_use]
    pub const fn state(&self) -> &RunState {
        &self.state
    }

    #[must_use]
    pub const fn rng(&self) -> &DeterministicRng {
        &self.rng
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        self.catalog
    }

    #[must_use]
    pub fn segment_history(&self) -> &[SegmentRecord] {
        &self.segments
    }

    #[must_use]
    pub fn draft_history(&self) -> &[DraftRecord] {
        &self.drafts
    }

    /// Combined tally across every segment played so far.
    #[must_use]
    pub fn total_tally(&self) -> OutcomeTally {
        let mut total = OutcomeTally::default();
        for record in &self.segments {
            total.absorb(&record.tally);
        }
        total
    }

    #[must_use]
    pub fn into_state(self) -> RunState {
        self.state
    }
}
