use anyhow::{Context, Result};
use fellowship_game::OutcomeTally;
use regex::Regex;

/// Counts outcome markers in segment transcripts.
///
/// Lines look like `[FAILURE] Troll Bridge (Combat 4 vs 5) - 8 damage`; the
/// scanner only relies on the bracketed marker and the damage suffix.
#[derive(Debug, Clone)]
pub struct TranscriptScanner {
    marker: Regex,
    damage: Regex,
}

impl TranscriptScanner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            marker: Regex::new(r"^\s*\[(SUCCESS|MITIGATED|FAILURE|SKIPPED)\]")
                .context("outcome marker pattern")?,
            damage: Regex::new(r"- (\d+) damage$").context("damage pattern")?,
        })
    }

    /// Tally every marked line. Skipped events also count as successes.
    #[must_use]
    pub fn tally<S: AsRef<str>>(&self, lines: &[S]) -> OutcomeTally {
        let mut tally = OutcomeTally::default();
        for line in lines {
            let Some(captures) = self.marker.captures(line.as_ref()) else {
                continue;
            };
            match &captures[1] {
                "SUCCESS" => tally.successes += 1,
                "SKIPPED" => {
                    tally.successes += 1;
                    tally.skipped += 1;
                }
                "MITIGATED" => tally.mitigated += 1,
                _ => tally.failures += 1,
            }
        }
        tally
    }

    /// Sum of damage reported on marked lines.
    #[must_use]
    pub fn damage<S: AsRef<str>>(&self, lines: &[S]) -> i64 {
        lines
            .iter()
            .map(AsRef::as_ref)
            .filter(|line| self.marker.is_match(line))
            .filter_map(|line| self.damage.captures(line))
            .filter_map(|captures| captures[1].parse::<i64>().ok())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fellowship_game::count_outcome_markers;

    const LINES: [&str; 6] = [
        "=== Segment 1: Combat trials ===",
        "[SUCCESS] Bandit Ambush (Combat 9 vs 3) - no damage",
        "[MITIGATED] Wolf Pack (Combat 4 vs 4) - 3 damage",
        "[FAILURE] Troll Bridge (Combat 4 vs 5) - 8 damage",
        "[SKIPPED] Arena Challenge - bypassed, no damage",
        "Squire reaches level 2.",
    ];

    #[test]
    fn regex_tally_agrees_with_core_counter() {
        let scanner = TranscriptScanner::new().unwrap();
        let tally = scanner.tally(&LINES);
        assert_eq!(tally, count_outcome_markers(&LINES));
        assert_eq!(tally.successes, 2);
        assert_eq!(tally.skipped, 1);
        assert_eq!(tally.mitigated, 1);
        assert_eq!(tally.failures, 1);
    }

    #[test]
    fn damage_sums_marked_lines_only() {
        let scanner = TranscriptScanner::new().unwrap();
        assert_eq!(scanner.damage(&LINES), 11);
        assert_eq!(scanner.damage(&["Took 40 damage - 40 damage"]), 0);
    }
}
