//! Score a rule tree over a sweep of network scenarios.
//!
//! # Example
//!
//! ```bash
//! # Score the default tree with a fixed seed
//! evaluate --seed 42 --ticks 100000
//!
//! # Score a trained tree and write the scored copy
//! evaluate --link-min 1 --link-max 10 if=trained.dna of=scored.dna
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use whisker_evaluator::{Evaluator, EvaluatorConfig};
use whisker_types::{ConfigRange, SeedSource};
use whisker_tools::{input_path, load_base_tree, output_path, split_keyword_args};

/// Whisker tree evaluator
///
/// Simulates the tree on links sampled across the given speed range and
/// prints the summed utility plus per-sender throughput and delay.
#[derive(Parser, Debug)]
#[command(name = "evaluate")]
#[command(version, about, long_about = None)]
struct Args {
    /// Slowest link, in packets per millisecond
    #[arg(long, default_value = "1.0")]
    link_min: f64,

    /// Fastest link, in packets per millisecond
    #[arg(long, default_value = "2.0")]
    link_max: f64,

    /// Round-trip time in milliseconds
    #[arg(long, default_value = "150")]
    rtt: f64,

    /// Senders sharing the bottleneck
    #[arg(short = 'n', long, default_value = "2")]
    senders: u32,

    /// Mean on duration in milliseconds
    #[arg(long, default_value = "5000")]
    on: f64,

    /// Mean off duration in milliseconds. Zero keeps senders on.
    #[arg(long, default_value = "5000")]
    off: f64,

    /// Link speed samples between the bounds
    #[arg(long, default_value = "64")]
    steps: u32,

    /// Simulated milliseconds per scenario, before carefulness
    #[arg(long, default_value = "1000000")]
    ticks: u64,

    /// Multiplier on the simulated time
    #[arg(short = 'c', long, default_value = "1")]
    carefulness: u32,

    /// Random seed for reproducible results. When omitted, a random seed is used.
    #[arg(long)]
    seed: Option<u64>,

    /// Log every whisker lookup at debug level
    #[arg(long)]
    trace: bool,

    /// Plain words; ignored
    #[arg(hide = true)]
    ignored: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,whisker_evaluator=info,whisker_tools=info")),
        )
        .init();

    let (flags, keywords) = split_keyword_args(std::env::args());
    let args = Args::parse_from(flags);

    let whiskers = load_base_tree(input_path(&keywords).as_deref())
        .context("Failed to load rule tree")?;

    let range = ConfigRange::default()
        .with_link_packets_per_ms(args.link_min, args.link_max)
        .with_rtt_ms(args.rtt, args.rtt)
        .with_max_senders(args.senders)
        .with_on_duration(args.on)
        .with_off_duration(args.off);
    let seeds = SeedSource::from_seed(args.seed.unwrap_or_else(rand::random));
    let config = EvaluatorConfig::default()
        .with_tick_count(args.ticks)
        .with_link_speed_steps(args.steps);

    let evaluator = Evaluator::with_config(whiskers, &range, &seeds, config)?;
    let outcome = evaluator.score(&[], args.trace, args.carefulness)?;

    info!(
        score = outcome.score,
        whiskers_used = outcome.used_whiskers.total_count(),
        "Evaluation complete"
    );

    println!("score = {}", outcome.score);
    for (net, measurements) in &outcome.throughputs_delays {
        for (index, m) in measurements.iter().enumerate() {
            println!(
                "link={} sender={} throughput={} delay={}",
                net.link_ppt, index, m.throughput, m.delay
            );
        }
    }

    if let Some(path) = output_path(&keywords) {
        outcome
            .used_whiskers
            .save(&path)
            .with_context(|| format!("Failed to save rule tree to {}", path.display()))?;
        info!(path = %path.display(), "Saved rule tree");
    }
    Ok(())
}
