//! Map steady-state cycles of a rule tree.
//!
//! Runs cycle detection over a grid of initial receive EWMAs and buffer
//! occupancies and prints one line per point:
//!
//! ```text
//! <rewma> <buffer> <cycle start> <cycle period>
//! ```
//!
//! `-1 -1` marks points where no cycle was confirmed.
//!
//! # Example
//!
//! ```bash
//! find-cycles if=trained.dna
//! find-cycles --threads 4 --horizon 5e7 if=trained.dna
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use whisker_cycles::{run_grid, CycleConfig, CycleDetector, CycleScenario, GridConfig};
use whisker_dispatch_pooled::PooledDispatch;
use whisker_tools::{input_path, load_base_tree, pool_config, split_keyword_args};

/// Whisker cycle finder
///
/// Simulates one always-on sender from many starting points and reports
/// where each trajectory settles into a cycle.
#[derive(Parser, Debug)]
#[command(name = "find-cycles")]
#[command(version, about, long_about = None)]
struct Args {
    /// Worker threads. Defaults to one less than the number of cores.
    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// Simulated milliseconds covered by the first coarse scan
    #[arg(long, default_value = "1e8")]
    horizon: f64,

    /// Coarse scans attempted per grid point before giving up
    #[arg(long, default_value = "8")]
    max_attempts: u32,

    /// Seed for every simulated network
    #[arg(long, default_value = "50")]
    seed: u64,

    /// Upper bound (exclusive) of the initial receive EWMA
    #[arg(long, default_value = "2.0")]
    rewma_max: f64,

    /// Upper bound (exclusive) of the initial buffer occupancy
    #[arg(long, default_value = "20")]
    buffer_max: u32,

    /// Plain words; ignored
    #[arg(hide = true)]
    ignored: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,whisker_cycles=info,whisker_tools=info")),
        )
        .init();

    let (flags, keywords) = split_keyword_args(std::env::args());
    let args = Args::parse_from(flags);

    let whiskers = load_base_tree(input_path(&keywords).as_deref())
        .context("Failed to load rule tree")?;
    let dispatch = PooledDispatch::new(pool_config(args.threads)?)?;

    let detector = CycleDetector::new(
        CycleConfig::default()
            .with_initial_horizon(args.horizon)
            .with_max_attempts(args.max_attempts),
    );
    let scenario = CycleScenario::default().with_seed(args.seed);
    let grid = GridConfig::default()
        .with_rewma(GridConfig::default().rewma_step, args.rewma_max)
        .with_buffer_max(args.buffer_max);

    info!(
        whiskers = whiskers.len(),
        seed = args.seed,
        horizon = args.horizon,
        threads = args.threads,
        "Starting cycle search"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut write_result = Ok(());
    let results = run_grid(
        Arc::new(whiskers),
        &scenario,
        &detector,
        &grid,
        &dispatch,
        |chunk| {
            if write_result.is_err() {
                return;
            }
            write_result = chunk
                .iter()
                .try_for_each(|result| writeln!(out, "{result}"))
                .and_then(|()| out.flush());
        },
    );
    write_result.context("Failed to write results")?;

    info!(
        points = results.len(),
        found = results.iter().filter(|r| r.outcome.is_found()).count(),
        "Cycle search complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> (Args, Vec<String>) {
        let (flags, keywords) = split_keyword_args(argv.iter().map(|s| s.to_string()));
        (Args::try_parse_from(flags).unwrap(), keywords)
    }

    #[test]
    fn test_flags_parse_around_keywords() {
        let (args, keywords) = parse(&["find-cycles", "--threads", "2", "if=tree.dna", "extra"]);
        assert_eq!(args.threads, Some(2));
        assert_eq!(keywords, vec!["if=tree.dna"]);
        assert_eq!(args.ignored, vec!["extra"]);
        assert_eq!(args.seed, 50);
    }

    #[test]
    fn test_flag_after_keyword_is_not_swallowed() {
        let (args, keywords) = parse(&["find-cycles", "if=t.dna", "--threads", "2"]);
        assert_eq!(args.threads, Some(2));
        assert_eq!(input_path(&keywords).unwrap().to_str(), Some("t.dna"));
    }

    #[test]
    fn test_defaults() {
        let (args, keywords) = parse(&["find-cycles"]);
        assert_eq!(args.horizon, 1e8);
        assert_eq!(args.max_attempts, 8);
        assert_eq!(args.buffer_max, 20);
        assert!(keywords.is_empty());
    }
}
