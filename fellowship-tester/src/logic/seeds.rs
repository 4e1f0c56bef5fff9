use anyhow::{Result, ensure};
use fellowship_game::Seed;

/// One concrete run seed expanded from a base seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub base: String,
    pub run_index: usize,
    pub seed: Seed,
}

impl SeedInfo {
    /// Seed for the `run_index`-th run of a batch: `"{base}_{run_index}"`.
    #[must_use]
    pub fn batch(base: &str, run_index: usize) -> Self {
        Self {
            base: base.to_string(),
            run_index,
            seed: Seed::Text(format!("{base}_{run_index}")),
        }
    }

    /// Literal seed used exactly as typed; numeric tokens become numeric seeds.
    #[must_use]
    pub fn literal(token: &str) -> Self {
        let seed = token
            .parse::<i64>()
            .map_or_else(|_| Seed::Text(token.to_string()), Seed::Number);
        Self {
            base: token.to_string(),
            run_index: 0,
            seed,
        }
    }
}

/// Resolve CLI seed tokens into run seeds.
///
/// A single run per token keeps the token as the seed; batches expand each
/// token into `runs` derived seeds.
pub fn resolve_seed_inputs(tokens: &[String], runs: usize) -> Result<Vec<SeedInfo>> {
    ensure!(runs > 0, "--runs must be at least 1");

    let mut bases: Vec<&str> = Vec::new();
    for token in tokens.iter().map(|token| token.trim()) {
        if !token.is_empty() && !bases.contains(&token) {
            bases.push(token);
        }
    }
    if bases.is_empty() {
        bases.push("fellowship");
    }

    let seeds = bases
        .into_iter()
        .flat_map(|base| {
            (0..runs).map(move |run_index| {
                if runs == 1 {
                    SeedInfo::literal(base)
                } else {
                    SeedInfo::batch(base, run_index)
                }
            })
        })
        .collect();
    Ok(seeds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batches_derive_indexed_text_seeds() {
        let seeds = resolve_seed_inputs(&["alpha".to_string()], 3).unwrap();
        let rendered: Vec<String> = seeds.iter().map(|s| s.seed.to_string()).collect();
        assert_eq!(rendered, ["alpha_0", "alpha_1", "alpha_2"]);
        assert!(seeds.iter().all(|s| s.base == "alpha"));
    }

    #[test]
    fn single_runs_keep_literal_and_numeric_seeds() {
        let raw = vec!["42".to_string(), "beta".to_string(), "42".to_string(), String::new()];
        let seeds = resolve_seed_inputs(&raw, 1).unwrap();
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].seed, Seed::Number(42));
        assert_eq!(seeds[1].seed, Seed::Text("beta".into()));
    }

    #[test]
    fn empty_input_falls_back_and_zero_runs_fail() {
        let seeds = resolve_seed_inputs(&[], 1).unwrap();
        assert_eq!(seeds[0].seed, Seed::Text("fellowship".into()));
        assert!(resolve_seed_inputs(&["x".to_string()], 0).is_err());
    }
}
