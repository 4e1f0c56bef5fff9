use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use crate::logic::aggregate::StrategyAggregate;
use crate::logic::simulation::RunRecord;

#[derive(Serialize)]
struct JsonReport<'a> {
    aggregates: &'a [StrategyAggregate],
    runs: &'a [RunRecord],
}

fn percent(rate: f64) -> f64 {
    rate * 100.0
}

pub fn generate_console_report(
    out: &mut dyn Write,
    aggregates: &[StrategyAggregate],
    records: &[RunRecord],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Fellowship Bot Results".bright_cyan().bold())?;
    writeln!(out, "{}", "=========================".cyan())?;
    writeln!(out, "Total runs: {}", records.len())?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for aggregate in aggregates {
        let status = if aggregate.determinism_failures == 0 {
            "✅".green()
        } else {
            "❌".red()
        };
        writeln!(out, "{status} {}", aggregate.strategy.label().bold())?;
        writeln!(
            out,
            "   Victories: {}/{} ({:.1}%)",
            aggregate.victories.to_string().green(),
            aggregate.runs,
            percent(aggregate.win_rate)
        )?;
        writeln!(
            out,
            "   Score: mean {:.1} | min {} | max {}",
            aggregate.mean_score, aggregate.min_score, aggregate.max_score
        )?;
        writeln!(
            out,
            "   Segments cleared: {:.2} avg",
            aggregate.mean_segments_cleared
        )?;
        writeln!(
            out,
            "   Outcomes: {} success ({} skipped) | {} mitigated | {} failed",
            aggregate.tally.successes.to_string().green(),
            aggregate.tally.skipped,
            aggregate.tally.mitigated.to_string().yellow(),
            aggregate.tally.failures.to_string().red()
        )?;
        if aggregate.determinism_failures > 0 {
            writeln!(
                out,
                "   {}",
                format!(
                    "{} run(s) diverged on replay",
                    aggregate.determinism_failures
                )
                .red()
            )?;
        }
        writeln!(out)?;
    }

    if let Some(best) = records.iter().max_by_key(|record| record.summary.score) {
        writeln!(out, "{}", "🏆 Best Run".bright_yellow().bold())?;
        writeln!(out, "{}", "==========".yellow())?;
        writeln!(
            out,
            "{} led by {} (seed {}): score {} - {}",
            best.strategy.label().green(),
            best.summary.leader_name,
            best.seed,
            best.summary.score,
            best.summary.ending
        )?;
    }
    Ok(())
}

pub fn generate_json_report(
    out: &mut dyn Write,
    aggregates: &[StrategyAggregate],
    records: &[RunRecord],
) -> Result<()> {
    let report = JsonReport {
        aggregates,
        runs: records,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(
    out: &mut dyn Write,
    aggregates: &[StrategyAggregate],
    records: &[RunRecord],
) -> Result<()> {
    writeln!(out, "# Fellowship Bot Results\n")?;
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total runs**: {}", records.len())?;
    writeln!(
        out,
        "- **Victories**: {}",
        records.iter().filter(|record| record.won()).count()
    )?;
    writeln!(out)?;

    writeln!(out, "## Strategies\n")?;
    writeln!(
        out,
        "| Strategy | Runs | Win rate | Mean score | Min | Max | Avg segments | Success | Mitigated | Failure |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|---|---|---|---|")?;
    for aggregate in aggregates {
        writeln!(
            out,
            "| {} | {} | {:.1}% | {:.1} | {} | {} | {:.2} | {} | {} | {} |",
            aggregate.strategy.label(),
            aggregate.runs,
            percent(aggregate.win_rate),
            aggregate.mean_score,
            aggregate.min_score,
            aggregate.max_score,
            aggregate.mean_segments_cleared,
            aggregate.tally.successes,
            aggregate.tally.mitigated,
            aggregate.tally.failures
        )?;
    }
    writeln!(out)?;

    let diverged: Vec<&StrategyAggregate> = aggregates
        .iter()
        .filter(|aggregate| aggregate.determinism_failures > 0)
        .collect();
    if !diverged.is_empty() {
        writeln!(out, "## Determinism Failures\n")?;
        for aggregate in diverged {
            writeln!(
                out,
                "- {}: {} run(s)",
                aggregate.strategy.label(),
                aggregate.determinism_failures
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn generate_csv_report(out: &mut dyn Write, records: &[RunRecord]) -> Result<()> {
    writeln!(
        out,
        "strategy,leader,seed,ending,score,segments_cleared,hp,members,total_levels,successes,mitigated,failures,skipped,damage_taken,digest"
    )?;
    for record in records {
        let summary = &record.summary;
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            record.strategy.key(),
            csv_field(&record.leader),
            csv_field(&record.seed.to_string()),
            csv_field(&summary.ending.to_string()),
            summary.score,
            summary.segments_cleared,
            summary.hp,
            summary.members,
            summary.total_levels,
            record.tally.successes,
            record.tally.mitigated,
            record.tally.failures,
            record.tally.skipped,
            record.damage_taken,
            record.digest
        )?;
    }
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::aggregate::aggregate_runs;
    use crate::logic::policy::GameplayStrategy;
    use crate::logic::simulation::{Simulator, TesterAssets};
    use fellowship_game::Seed;
    use std::sync::Arc;

    fn sample() -> (Vec<StrategyAggregate>, Vec<RunRecord>) {
        let simulator = Simulator::new(Arc::new(TesterAssets::load(None).unwrap())).unwrap();
        let records = vec![
            simulator
                .run("warden", &Seed::from("report_0"), GameplayStrategy::Balanced)
                .unwrap(),
            simulator
                .run("bard", &Seed::from("report_1"), GameplayStrategy::FirstPick)
                .unwrap(),
        ];
        (aggregate_runs(&records, &[]), records)
    }

    #[test]
    fn csv_has_header_and_row_per_run() {
        let (_, records) = sample();
        let mut buffer = Vec::new();
        generate_csv_report(&mut buffer, &records).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("strategy,leader,seed"));
        assert!(lines[1].starts_with("balanced,warden,report_0,"));
    }

    #[test]
    fn json_report_parses_back() {
        let (aggregates, records) = sample();
        let mut buffer = Vec::new();
        generate_json_report(&mut buffer, &aggregates, &records).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["runs"].as_array().unwrap().len(), 2);
        assert_eq!(value["aggregates"][0]["strategy"], "first-pick");
        assert!(value["runs"][0].get("transcript").is_none());
    }

    #[test]
    fn markdown_lists_every_strategy() {
        let (aggregates, records) = sample();
        let mut buffer = Vec::new();
        generate_markdown_report(&mut buffer, &aggregates, &records).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("# Fellowship Bot Results"));
        assert!(text.contains("| Balanced |"));
        assert!(text.contains("| First Pick |"));
        assert!(!text.contains("Determinism Failures"));
    }

    #[test]
    fn csv_fields_are_quoted_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
