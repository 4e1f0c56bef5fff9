use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use fellowship_game::{
    Catalog, FellowshipEngine, JsonCatalogLoader, OutcomeTally, RunState, RunSummary, Seed,
};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::logic::policy::GameplayStrategy;
use crate::logic::transcript::TranscriptScanner;

/// Content the tester plays against.
#[derive(Debug, Clone)]
pub struct TesterAssets {
    engine: FellowshipEngine<JsonCatalogLoader>,
}

impl TesterAssets {
    #[must_use]
    pub fn default_catalog_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("assets")
            .join("data")
            .join("catalog.json")
    }

    /// Load and validate the catalog at `path`, or the bundled one.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let source = path.map_or_else(Self::default_catalog_path, Path::to_path_buf);
        let engine = FellowshipEngine::new(JsonCatalogLoader::new(&source))
            .with_context(|| format!("failed to load catalog from {}", source.display()))?;
        Ok(Self { engine })
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        self.engine.catalog()
    }

    #[must_use]
    pub fn source(&self) -> &Path {
        self.engine.loader().path()
    }

    /// Leader ids to play; `all` or an empty list selects every leader.
    pub fn resolve_leaders(&self, tokens: &[String]) -> Result<Vec<String>> {
        let all = tokens.is_empty() || tokens.iter().any(|t| t.eq_ignore_ascii_case("all"));
        if all {
            return Ok(self.catalog().leaders.iter().map(|l| l.id.clone()).collect());
        }
        let mut leaders = Vec::new();
        for token in tokens {
            if self.catalog().leader(token).is_none() {
                bail!("Unknown leader: {token}");
            }
            if !leaders.contains(token) {
                leaders.push(token.clone());
            }
        }
        Ok(leaders)
    }
}

/// One draft decision made by a policy.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRecord {
    pub after_segment: u32,
    pub choice: usize,
    pub picked: Option<String>,
    pub policy_name: String,
    pub rationale: Option<String>,
}

/// Everything the tester keeps about one finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub strategy: GameplayStrategy,
    pub leader: String,
    pub seed: Seed,
    pub summary: RunSummary,
    pub tally: OutcomeTally,
    pub damage_taken: i64,
    pub decisions: Vec<DecisionRecord>,
    pub digest: String,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    #[serde(skip)]
    pub transcript: Vec<String>,
}

impl RunRecord {
    #[must_use]
    pub const fn won(&self) -> bool {
        matches!(self.summary.ending, fellowship_game::Ending::Victory)
    }
}

/// Plays complete runs with a policy choosing every draft.
pub struct Simulator {
    assets: Arc<TesterAssets>,
    scanner: TranscriptScanner,
}

impl Simulator {
    pub fn new(assets: Arc<TesterAssets>) -> Result<Self> {
        Ok(Self {
            assets,
            scanner: TranscriptScanner::new()?,
        })
    }

    /// Play one run to completion.
    pub fn run(&self, leader: &str, seed: &Seed, strategy: GameplayStrategy) -> Result<RunRecord> {
        let start = Instant::now();
        let mut session = self
            .assets
            .engine
            .create_session(leader, seed.clone())
            .with_context(|| format!("failed to start run for leader {leader} seed {seed}"))?;
        let mut policy = strategy.create_policy(seed);
        let mut transcript = Vec::new();
        let mut decisions = Vec::new();

        while !session.is_over() {
            let outcome = session
                .play_segment()
                .with_context(|| format!("segment failed for leader {leader} seed {seed}"))?;
            transcript.extend(outcome.log);
            if session.is_over() {
                break;
            }
            let options = session.draft_options()?.clone();
            let decision = policy.pick_option(session.state(), &options);
            log::debug!(
                "{} picked {} after segment {}",
                policy.name(),
                decision.choice,
                session.state().segments_cleared()
            );
            session.choose(decision.choice)?;
            decisions.push(DecisionRecord {
                after_segment: session.state().segments_cleared(),
                choice: decision.choice,
                picked: decision
                    .choice
                    .checked_sub(1)
                    .and_then(|index| options.get(index))
                    .map(|option| option.description.clone()),
                policy_name: policy.name().to_string(),
                rationale: decision.rationale,
            });
        }

        let tally = self.scanner.tally(&transcript);
        if tally != session.total_tally() {
            log::warn!(
                "transcript tally {tally:?} disagrees with session tally {:?} for {leader}/{seed}",
                session.total_tally()
            );
        }

        Ok(RunRecord {
            strategy,
            leader: leader.to_string(),
            seed: seed.clone(),
            summary: session.summary(),
            tally,
            damage_taken: self.scanner.damage(&transcript),
            decisions,
            digest: state_digest(session.state())?,
            duration: start.elapsed(),
            transcript,
        })
    }

    /// Replay a recorded run and report whether its final state matches.
    pub fn verify_determinism(&self, record: &RunRecord) -> Result<bool> {
        let replay = self.run(&record.leader, &record.seed, record.strategy)?;
        Ok(replay.digest == record.digest && replay.summary == record.summary)
    }
}

/// SHA-256 of the serialized final state, transcript excluded.
pub fn state_digest(state: &RunState) -> Result<String> {
    let buffer = serde_json::to_vec(&state.without_log()).context("serialize run state")?;
    let mut hasher = Sha256::new();
    hasher.update(&buffer);
    Ok(hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect())
}

mod duration_millis {
    use serde::{Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }
}
