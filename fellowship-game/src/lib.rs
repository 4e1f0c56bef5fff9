//! Fellowship Game Engine
//!
//! Deterministic, seed-driven run simulation for the Fellowship progression
//! game: curriculum generation, stat aggregation, event resolution, segment
//! play, drafting, and scoring. No UI or platform dependencies.

pub mod aggregate;
pub mod catalog;
pub mod constants;
pub mod curriculum;
pub mod draft;
pub mod error;
pub mod numbers;
pub mod resolver;
pub mod result;
pub mod rng;
pub mod segment;
pub mod session;
pub mod state;
pub mod stats;

use std::path::{Path, PathBuf};

pub use aggregate::{active_temp_boosts, compute_stats, member_contribution};
pub use catalog::{
    Catalog, EventTemplate, GearKind, GearTemplate, Leader, MemberTemplate, StatTags,
    TacticKind, TacticTemplate, Tuning,
};
pub use curriculum::{
    CheckType, DamageTable, EventDefinition, SegmentDefinition, SegmentType, StatThreshold,
    event_threshold, generate_segments, single_stat_chance,
};
pub use draft::{
    DraftKind, DraftOption, DraftPayload, apply_draft_choice, get_draft_options,
    member_rank_for_segment,
};
pub use error::{CatalogLoadError, FellowshipError, FellowshipResult};
pub use resolver::{
    CheckResult, EventResolution, Outcome, StatCheck, combine_checks, resolve_event,
};
pub use result::{Ending, RunSummary, ScoreBreakdown, score_run, select_ending, summarize_run};
pub use rng::{DeterministicRng, Seed};
pub use segment::{OutcomeTally, SegmentOutcome, count_outcome_markers, simulate_segment};
pub use session::{DraftRecord, RunSession, SegmentRecord};
pub use state::{
    GearInstance, MemberInstance, PermanentBoosts, RunState, TacticInstance, create_run,
    is_run_over,
};
pub use stats::{Stat, Stats, TempBoosts};

/// Trait for abstracting catalog loading.
/// Platform-specific front-ends provide their own implementation.
pub trait CatalogLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the content catalog from the platform-specific source.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    fn load_catalog(&self) -> Result<Catalog, Self::Error>;
}

/// Loads and validates a catalog from a JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonCatalogLoader {
    path: PathBuf,
}

impl JsonCatalogLoader {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogLoader for JsonCatalogLoader {
    type Error = CatalogLoadError;

    fn load_catalog(&self) -> Result<Catalog, Self::Error> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| CatalogLoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        let catalog = Catalog::from_json(&raw).map_err(|source| CatalogLoadError::Parse {
            path: self.path.clone(),
            source,
        })?;
        catalog.validate()?;
        log::debug!(
            "loaded catalog {} ({} leaders, {} members)",
            self.path.display(),
            catalog.leaders.len(),
            catalog.members.len()
        );
        Ok(catalog)
    }
}

/// Main engine holding a loaded catalog for starting runs.
#[derive(Debug, Clone)]
pub struct FellowshipEngine<L>
where
    L: CatalogLoader,
{
    loader: L,
    catalog: Catalog,
}

impl<L> FellowshipEngine<L>
where
    L: CatalogLoader,
{
    /// Load the catalog through `loader` and keep it for later runs.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    pub fn new(loader: L) -> Result<Self, L::Error> {
        let catalog = loader.load_catalog()?;
        Ok(Self { loader, catalog })
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn loader(&self) -> &L {
        &self.loader
    }

    /// Create a fresh run state and its RNG.
    ///
    /// # Errors
    ///
    /// Returns an error if the leader is unknown or the catalog is incomplete.
    pub fn create_run(
        &self,
        leader_id: &str,
        seed: impl Into<Seed>,
    ) -> FellowshipResult<(RunState, DeterministicRng)> {
        create_run(&self.catalog, leader_id, seed)
    }

    /// Start a session bound to this engine's catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the leader is unknown or the catalog is incomplete.
    pub fn create_session(
        &self,
        leader_id: &str,
        seed: impl Into<Seed>,
    ) -> FellowshipResult<RunSession<'_>> {
        RunSession::new(&self.catalog, leader_id, seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[derive(Clone, Copy, Default)]
    struct FixtureLoader;

    impl CatalogLoader for FixtureLoader {
        type Error = Infallible;

        fn load_catalog(&self) -> Result<Catalog, Self::Error> {
            Ok(catalog::fixtures::catalog())
        }
    }

    #[test]
    fn engine_creates_runs_from_loaded_catalog() {
        let engine = FellowshipEngine::new(FixtureLoader).unwrap();
        let (state, _rng) = engine.create_run("warden", "engine").unwrap();
        assert_eq!(state.leader.id, "warden");
        assert_eq!(state.segments.len(), 10);

        let err = engine.create_run("ghost", "engine").unwrap_err();
        assert_eq!(err, FellowshipError::LeaderNotFound("ghost".into()));
    }

    #[test]
    fn engine_session_matches_direct_run() {
        let engine = FellowshipEngine::new(FixtureLoader).unwrap();
        let session = engine.create_session("bard", 42_i64).unwrap();
        let (state, rng) = engine.create_run("bard", 42_i64).unwrap();
        assert_eq!(session.state(), &state);
        assert_eq!(session.rng(), &rng);
    }

    #[test]
    fn json_loader_reports_missing_file() {
        let loader = JsonCatalogLoader::new("does/not/exist.json");
        let err = loader.load_catalog().unwrap_err();
        assert!(matches!(err, CatalogLoadError::Io { .. }));
        assert!(err.to_string().contains("does/not/exist.json"));
    }

    #[test]
    fn json_loader_reads_bundled_catalog() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../assets/data/catalog.json");
        let engine = FellowshipEngine::new(JsonCatalogLoader::new(&path)).unwrap();
        assert_eq!(engine.loader().path(), path.as_path());
        assert!(!engine.catalog().leaders.is_empty());
    }
}
