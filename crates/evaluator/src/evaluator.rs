use crate::{sample_configs, EvaluatorError};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use whisker_dispatch::Dispatch;
use whisker_network::{Network, Rat, SenderMeasurement};
use whisker_types::{seeded_prng, ConfigRange, NetConfig, Prng, SeedSource, Whisker, WhiskerTree};

/// Tunables for an [`Evaluator`].
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatorConfig {
    /// Simulated milliseconds per configuration at carefulness 1.
    pub tick_count: u64,
    /// Number of geometric steps across the link-speed range.
    pub link_speed_steps: u32,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            tick_count: 1_000_000,
            link_speed_steps: 64,
        }
    }
}

impl EvaluatorConfig {
    pub fn with_tick_count(mut self, tick_count: u64) -> Self {
        self.tick_count = tick_count;
        self
    }

    pub fn with_link_speed_steps(mut self, steps: u32) -> Self {
        self.link_speed_steps = steps;
        self
    }
}

/// Result of scoring one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Sum of every sender's utility over every configuration.
    pub score: f64,
    /// The tree that was simulated, with usage counts from all runs.
    pub used_whiskers: WhiskerTree,
    /// Per-sender measurements for each configuration, in sweep order.
    pub throughputs_delays: Vec<(NetConfig, Vec<SenderMeasurement>)>,
}

/// Scores rule changes against a fixed ensemble of network configurations.
///
/// The seed is drawn once at construction, so every call to
/// [`score`](Self::score) sees the same environmental randomness.
#[derive(Debug, Clone)]
pub struct Evaluator {
    config: EvaluatorConfig,
    seed: u64,
    prng: Prng,
    whiskers: WhiskerTree,
    configs: Vec<NetConfig>,
}

impl Evaluator {
    pub fn new(
        whiskers: WhiskerTree,
        range: &ConfigRange,
        seeds: &SeedSource,
    ) -> Result<Self, EvaluatorError> {
        Self::with_config(whiskers, range, seeds, EvaluatorConfig::default())
    }

    pub fn with_config(
        whiskers: WhiskerTree,
        range: &ConfigRange,
        seeds: &SeedSource,
        config: EvaluatorConfig,
    ) -> Result<Self, EvaluatorError> {
        let configs = sample_configs(range, config.link_speed_steps)?;
        let seed = seeds.next_seed();

        info!(
            configs = configs.len(),
            seed,
            link_min = range.link_packets_per_ms.0,
            link_max = range.link_packets_per_ms.1,
            rtt = range.rtt_ms.0,
            senders = range.max_senders,
            whiskers = whiskers.len(),
            "Evaluator ready"
        );

        Ok(Self {
            config,
            seed,
            prng: seeded_prng(seed),
            whiskers,
            configs,
        })
    }

    /// The sampled configurations, ascending by link speed.
    pub fn configs(&self) -> &[NetConfig] {
        &self.configs
    }

    /// The tree candidates are applied to. Never modified by scoring.
    pub fn base_whiskers(&self) -> &WhiskerTree {
        &self.whiskers
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Score the base tree with `replacements` applied.
    ///
    /// Every replacement must have the same domain as a whisker in the base
    /// tree. `trace` logs each whisker lookup at debug level; it never
    /// changes the result. Each configuration runs for
    /// `tick_count * carefulness` simulated milliseconds.
    #[instrument(level = "debug", skip_all, fields(replacements = replacements.len(), carefulness = carefulness))]
    pub fn score(
        &self,
        replacements: &[Whisker],
        trace: bool,
        carefulness: u32,
    ) -> Result<Outcome, EvaluatorError> {
        let mut run_whiskers = self.whiskers.clone();
        for replacement in replacements {
            if !run_whiskers.replace(replacement.clone()) {
                return Err(EvaluatorError::NoMatchingWhisker {
                    domain: *replacement.domain(),
                });
            }
        }
        run_whiskers.reset_counts();

        let shared = Arc::new(run_whiskers);
        let mut usage = shared.new_tally();
        let duration = self.config.tick_count as f64 * f64::from(carefulness);

        let mut prng = self.prng.clone();
        let mut score = 0.0;
        let mut throughputs_delays = Vec::with_capacity(self.configs.len());

        for config in &self.configs {
            let rat = Rat::new(Arc::clone(&shared), trace);
            let mut network = Network::new(rat, prng, config);
            network.run_simulation(duration);

            let senders = network.senders();
            let utility = senders.utility();
            debug!(link_ppt = config.link_ppt, utility, "Configuration simulated");

            score += utility;
            throughputs_delays.push((*config, senders.throughputs_delays()));
            for sender in senders.iter() {
                usage.merge(sender.sender().usage());
            }

            // The next configuration continues the same random stream.
            prng = network.into_prng();
        }

        let mut used_whiskers = Arc::try_unwrap(shared).unwrap_or_else(|tree| (*tree).clone());
        used_whiskers.record_usage(&usage);

        Ok(Outcome {
            score,
            used_whiskers,
            throughputs_delays,
        })
    }

    /// Score several candidates concurrently.
    ///
    /// Each candidate is scored exactly as [`score`](Self::score) would,
    /// with tracing off. Outcomes are returned in candidate order; the first
    /// failing candidate's error is returned instead.
    pub fn score_batch<D: Dispatch>(
        &self,
        candidates: &[Vec<Whisker>],
        carefulness: u32,
        dispatch: &D,
    ) -> Result<Vec<Outcome>, EvaluatorError> {
        debug!(
            candidates = candidates.len(),
            parallelism = dispatch.parallelism(),
            "Scoring batch"
        );
        dispatch
            .map(candidates, |replacements| {
                self.score(replacements, false, carefulness)
            })
            .into_iter()
            .collect()
    }
}
