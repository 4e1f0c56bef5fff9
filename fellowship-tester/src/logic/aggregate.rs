use std::collections::BTreeMap;

use fellowship_game::OutcomeTally;
use serde::Serialize;

use crate::logic::policy::GameplayStrategy;
use crate::logic::simulation::RunRecord;

/// Batch statistics for one strategy.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyAggregate {
    pub strategy: GameplayStrategy,
    pub runs: usize,
    pub victories: usize,
    pub win_rate: f64,
    pub mean_score: f64,
    pub min_score: i64,
    pub max_score: i64,
    pub mean_segments_cleared: f64,
    pub tally: OutcomeTally,
    pub determinism_failures: usize,
}

/// Group records by strategy, in strategy order.
#[must_use]
pub fn aggregate_runs(records: &[RunRecord], mismatched: &[usize]) -> Vec<StrategyAggregate> {
    let mut grouped: BTreeMap<GameplayStrategy, Vec<(usize, &RunRecord)>> = BTreeMap::new();
    for (index, record) in records.iter().enumerate() {
        grouped
            .entry(record.strategy)
            .or_default()
            .push((index, record));
    }

    grouped
        .into_iter()
        .map(|(strategy, runs)| {
            let mut tally = OutcomeTally::default();
            let mut total_score = 0_i64;
            let mut total_cleared = 0_u64;
            for (_, record) in &runs {
                tally.absorb(&record.tally);
                total_score += record.summary.score;
                total_cleared += u64::from(record.summary.segments_cleared);
            }
            let victories = runs.iter().filter(|(_, record)| record.won()).count();
            let count = runs.len();
            #[allow(clippy::cast_precision_loss)]
            let denominator = count.max(1) as f64;
            #[allow(clippy::cast_precision_loss)]
            let (win_rate, mean_score, mean_cleared) = (
                victories as f64 / denominator,
                total_score as f64 / denominator,
                total_cleared as f64 / denominator,
            );
            StrategyAggregate {
                strategy,
                runs: count,
                victories,
                win_rate,
                mean_score,
                min_score: runs.iter().map(|(_, r)| r.summary.score).min().unwrap_or(0),
                max_score: runs.iter().map(|(_, r)| r.summary.score).max().unwrap_or(0),
                mean_segments_cleared: mean_cleared,
                tally,
                determinism_failures: runs
                    .iter()
                    .filter(|(index, _)| mismatched.contains(index))
                    .count(),
            }
        })
        .collect()
}
