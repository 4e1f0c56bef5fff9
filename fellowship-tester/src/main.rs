mod logic;

use anyhow::{Context, Result, ensure};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use logic::{
    GameplayStrategy, RunRecord, SeedInfo, Simulator, StrategyAggregate, TesterAssets,
    aggregate_runs, resolve_seed_inputs,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
    Csv,
}

#[derive(Debug, Parser)]
#[command(name = "fellowship-tester", version = "0.1.0")]
#[command(about = "Strategy-driven bot runner for the Fellowship run simulation")]
struct Args {
    /// Strategies to run (comma-separated, or "all")
    #[arg(long, default_value = "all")]
    strategies: String,

    /// List all available strategies and exit
    #[arg(long)]
    list_strategies: bool,

    /// Base seeds (comma-separated)
    #[arg(long, default_value = "fellowship")]
    seed: String,

    /// Runs per base seed; batches derive "{seed}_{index}" seeds
    #[arg(long, default_value_t = 1)]
    runs: usize,

    /// Leader ids to play (comma-separated, or "all")
    #[arg(long, default_value = "all")]
    leaders: String,

    /// Catalog JSON to load instead of the bundled one
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print every run as it finishes
    #[arg(short, long)]
    verbose: bool,

    /// Replay each run and compare final-state digests
    #[arg(long)]
    verify_determinism: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_strategies(&args)? {
        return Ok(());
    }

    announce_banner(&args);

    let start_time = Instant::now();
    let strategies = expand_strategies(&args.strategies)?;
    let seeds = resolve_seed_inputs(&split_csv(&args.seed), args.runs)?;
    let assets = Arc::new(TesterAssets::load(args.catalog.as_deref())?);
    let leaders = assets.resolve_leaders(&split_csv(&args.leaders))?;
    log::info!(
        "catalog {} with {} leader(s)",
        assets.source().display(),
        leaders.len()
    );
    let simulator = Simulator::new(assets)?;

    let records = run_batch(&args, &simulator, &strategies, &leaders, &seeds)?;
    let mismatched = if args.verify_determinism {
        verify_records(&args, &simulator, &records)?
    } else {
        Vec::new()
    };
    let aggregates = aggregate_runs(&records, &mismatched);

    write_reports(&args, &aggregates, &records, start_time)?;

    ensure!(
        mismatched.is_empty(),
        "{} run(s) diverged on replay",
        mismatched.len()
    );
    Ok(())
}

fn maybe_list_strategies(args: &Args) -> Result<bool> {
    if !args.list_strategies {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available strategies:")?;
    for strategy in GameplayStrategy::ALL {
        writeln!(
            output_target.writer(),
            "  {:12} - {}",
            strategy.key(),
            strategy.description()
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner(args: &Args) {
    if args.report != ReportFormat::Console && args.output.is_none() {
        return;
    }
    println!("{}", "🛡️ Fellowship Automated Tester".bright_cyan().bold());
    println!("{}", "==============================".cyan());
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn expand_strategies(raw: &str) -> Result<Vec<GameplayStrategy>> {
    let tokens = split_csv(raw);
    if tokens.is_empty() || tokens.iter().any(|t| t.eq_ignore_ascii_case("all")) {
        return Ok(GameplayStrategy::ALL.to_vec());
    }
    let mut strategies = Vec::new();
    for token in tokens {
        let strategy = token.parse::<GameplayStrategy>()?;
        if !strategies.contains(&strategy) {
            strategies.push(strategy);
        }
    }
    Ok(strategies)
}

fn run_batch(
    args: &Args,
    simulator: &Simulator,
    strategies: &[GameplayStrategy],
    leaders: &[String],
    seeds: &[SeedInfo],
) -> Result<Vec<RunRecord>> {
    let mut records = Vec::with_capacity(strategies.len() * leaders.len() * seeds.len());
    for &strategy in strategies {
        for leader in leaders {
            for info in seeds {
                log::debug!(
                    "{} / {leader}: run {} of base seed {}",
                    strategy.key(),
                    info.run_index,
                    info.base
                );
                let record = simulator.run(leader, &info.seed, strategy)?;
                if args.verbose {
                    print_run(&record);
                }
                records.push(record);
            }
        }
    }
    Ok(records)
}

fn print_run(record: &RunRecord) {
    let status = if record.won() {
        "✅ WIN ".green()
    } else {
        "💀 LOSS".red()
    };
    println!(
        "  {status} {:16} {:10} seed {:20} score {:5} segments {:2} ({:?})",
        record.strategy.label(),
        record.leader,
        record.seed.to_string(),
        record.summary.score,
        record.summary.segments_cleared,
        record.duration
    );
}

fn verify_records(args: &Args, simulator: &Simulator, records: &[RunRecord]) -> Result<Vec<usize>> {
    let mut mismatched = Vec::new();
    for (index, record) in records.iter().enumerate() {
        if !simulator.verify_determinism(record)? {
            if args.verbose {
                println!(
                    "  {} {} {} seed {}",
                    "❌ replay diverged:".red(),
                    record.strategy.label(),
                    record.leader,
                    record.seed
                );
            }
            mismatched.push(index);
        }
    }
    Ok(mismatched)
}

fn write_reports(
    args: &Args,
    aggregates: &[StrategyAggregate],
    records: &[RunRecord],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report {
        ReportFormat::Json => {
            logic::reports::generate_json_report(output_target.writer(), aggregates, records)?;
        }
        ReportFormat::Markdown => {
            logic::reports::generate_markdown_report(output_target.writer(), aggregates, records)?;
        }
        ReportFormat::Csv => {
            logic::reports::generate_csv_report(output_target.writer(), records)?;
        }
        ReportFormat::Console => {
            if records.is_empty() {
                writeln!(output_target.writer(), "No runs executed.")?;
            } else {
                logic::reports::generate_console_report(
                    output_target.writer(),
                    aggregates,
                    records,
                    start_time.elapsed(),
                )?;
            }
            writeln!(output_target.writer())?;
            writeln!(
                output_target.writer(),
                "🏁 Total time: {:?}",
                start_time.elapsed()
            )?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}
