pub mod aggregate;
pub mod policy;
pub mod reports;
pub mod seeds;
pub mod simulation;
pub mod transcript;

pub use aggregate::{StrategyAggregate, aggregate_runs};
pub use policy::GameplayStrategy;
pub use seeds::{SeedInfo, resolve_seed_inputs};
pub use simulation::{RunRecord, Simulator, TesterAssets};
