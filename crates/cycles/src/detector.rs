use crate::{QuantizedState, Trajectory};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Tunables for a [`CycleDetector`].
#[derive(Debug, Clone, PartialEq)]
pub struct CycleConfig {
    /// Lattice scale: exact states are multiplied by this and truncated.
    pub quantizer: f64,
    /// Repeated hashes collected before a coarse scan stops early.
    pub match_max: u32,
    /// Simulated time covered by the first coarse scan.
    pub initial_horizon: f64,
    /// Factor by which the horizon grows after a failed verification.
    pub horizon_growth: f64,
    /// Coarse scans attempted before giving up.
    pub max_attempts: u32,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            quantizer: 1e8,
            match_max: 50,
            initial_horizon: 1e8,
            horizon_growth: 2.0,
            max_attempts: 8,
        }
    }
}

impl CycleConfig {
    pub fn with_quantizer(mut self, quantizer: f64) -> Self {
        self.quantizer = quantizer;
        self
    }

    pub fn with_match_max(mut self, match_max: u32) -> Self {
        self.match_max = match_max;
        self
    }

    pub fn with_initial_horizon(mut self, horizon: f64) -> Self {
        self.initial_horizon = horizon;
        self
    }

    pub fn with_horizon_growth(mut self, growth: f64) -> Self {
        self.horizon_growth = growth;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }
}

/// What the detector concluded about one trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// The state at `start` recurs `period` later.
    Found { start: f64, period: f64 },
    /// No cycle was confirmed within the search budget.
    NotFound,
}

impl CycleOutcome {
    /// `(start, period)`, or `(-1, -1)` when no cycle was found.
    pub fn as_pair(&self) -> (f64, f64) {
        match *self {
            CycleOutcome::Found { start, period } => (start, period),
            CycleOutcome::NotFound => (-1.0, -1.0),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, CycleOutcome::Found { .. })
    }
}

/// Coarse-scan state carried across attempts.
struct CoarseScan<T> {
    trajectory: T,
    seen: HashSet<u64>,
    candidates: HashSet<u64>,
    last_state: Option<QuantizedState>,
    exhausted: bool,
}

/// Two-phase quantize, hash and verify cycle search.
#[derive(Debug, Clone, Default)]
pub struct CycleDetector {
    config: CycleConfig,
}

impl CycleDetector {
    pub fn new(config: CycleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    fn quantize<T: Trajectory>(&self, trajectory: &T) -> QuantizedState {
        QuantizedState::from_exact(&trajectory.state(), self.config.quantizer)
    }

    /// Search the trajectory produced by `build` for a cycle.
    ///
    /// `build` is called once for the coarse scan and once per verification,
    /// and must return an identical, freshly started trajectory every time.
    pub fn detect<T, F>(&self, mut build: F) -> CycleOutcome
    where
        T: Trajectory,
        F: FnMut() -> T,
    {
        let mut scan = CoarseScan {
            trajectory: build(),
            seen: HashSet::new(),
            candidates: HashSet::new(),
            last_state: None,
            exhausted: false,
        };
        let mut horizon = self.config.initial_horizon;

        for attempt in 1..=self.config.max_attempts {
            self.coarse_scan(&mut scan, horizon);
            let scanned_to = scan.trajectory.time();
            debug!(
                attempt,
                horizon,
                scanned_to,
                candidates = scan.candidates.len(),
                "Coarse scan finished"
            );

            if !scan.candidates.is_empty() {
                if let Some(outcome) = self.verify(build(), &scan.candidates, scanned_to) {
                    if let CycleOutcome::Found { start, period } = outcome {
                        info!(attempt, start, period, "Cycle confirmed");
                    }
                    return outcome;
                }
            }

            if scan.exhausted {
                debug!(attempt, "Trajectory has no further events");
                return CycleOutcome::NotFound;
            }
            horizon *= self.config.horizon_growth;
        }

        warn!(
            attempts = self.config.max_attempts,
            horizon, "No cycle confirmed, giving up"
        );
        CycleOutcome::NotFound
    }

    /// Phase one: extend the scan to `horizon`, collecting candidate hashes.
    fn coarse_scan<T: Trajectory>(&self, scan: &mut CoarseScan<T>, horizon: f64) {
        let mut match_count = 0;
        while scan.trajectory.time() < horizon {
            if !scan.trajectory.advance() {
                scan.exhausted = true;
                return;
            }
            let state = self.quantize(&scan.trajectory);
            // A state that has not changed is not a new sample.
            if scan.last_state.as_ref() == Some(&state) {
                continue;
            }

            let hash = state.hash_value();
            if scan.seen.contains(&hash) {
                scan.candidates.insert(hash);
                if match_count >= self.config.match_max {
                    return;
                }
                match_count += 1;
            } else {
                scan.seen
                    .extend(state.fuzz().iter().map(QuantizedState::hash_value));
            }
            scan.last_state = Some(state);
        }
    }

    /// Phase two: replay to `until`, confirming a candidate exactly.
    fn verify<T: Trajectory>(
        &self,
        mut trajectory: T,
        candidates: &HashSet<u64>,
        until: f64,
    ) -> Option<CycleOutcome> {
        let mut recorded: HashMap<QuantizedState, f64> = HashMap::new();
        let mut last_state: Option<QuantizedState> = None;

        while trajectory.time() < until {
            if !trajectory.advance() {
                break;
            }
            let now = trajectory.time();
            let state = self.quantize(&trajectory);
            if last_state.as_ref() == Some(&state) {
                continue;
            }

            if candidates.contains(&state.hash_value()) {
                if let Some(&start) = recorded.get(&state) {
                    return Some(CycleOutcome::Found {
                        start,
                        period: now - start,
                    });
                }
                for neighbour in state.fuzz() {
                    recorded.insert(neighbour, now);
                }
            }
            last_state = Some(state);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Steps through a precomputed list of states, one time unit apart.
    struct Scripted {
        states: Vec<Vec<f64>>,
        index: usize,
    }

    impl Trajectory for Scripted {
        fn advance(&mut self) -> bool {
            if self.index + 1 >= self.states.len() {
                return false;
            }
            self.index += 1;
            true
        }

        fn time(&self) -> f64 {
            self.index as f64
        }

        fn state(&self) -> Vec<f64> {
            self.states[self.index].clone()
        }
    }

    fn scripted(states: Vec<Vec<f64>>) -> impl FnMut() -> Scripted {
        move || Scripted {
            states: states.clone(),
            index: 0,
        }
    }

    fn small_config() -> CycleConfig {
        CycleConfig::default()
            .with_initial_horizon(50.0)
            .with_max_attempts(3)
    }

    #[test]
    fn test_outcome_pairs() {
        let found = CycleOutcome::Found {
            start: 3.0,
            period: 4.0,
        };
        assert_eq!(found.as_pair(), (3.0, 4.0));
        assert!(found.is_found());
        assert_eq!(CycleOutcome::NotFound.as_pair(), (-1.0, -1.0));
    }

    #[test]
    fn test_repeating_script_is_found() {
        let mut states = vec![vec![100.0], vec![101.0], vec![102.0]];
        for n in 0..60 {
            states.push(vec![(n % 4) as f64]);
        }
        let detector = CycleDetector::new(small_config());
        assert_eq!(
            detector.detect(scripted(states)),
            CycleOutcome::Found {
                start: 3.0,
                period: 4.0
            }
        );
    }

    #[test]
    fn test_exhausted_script_stops_early() {
        let states = (0..10).map(|n| vec![n as f64]).collect();
        let detector = CycleDetector::new(small_config().with_max_attempts(1_000));
        assert_eq!(detector.detect(scripted(states)), CycleOutcome::NotFound);
    }

    #[test]
    fn test_static_state_is_not_a_cycle() {
        let states = vec![vec![5.0]; 200];
        let detector = CycleDetector::new(small_config());
        assert_eq!(detector.detect(scripted(states)), CycleOutcome::NotFound);
    }

    #[test]
    fn test_quantization_noise_is_tolerated() {
        // Second lap lands one lattice unit above the first.
        let lap = [1.0, 2.0, 3.0, 4.0, 5.0];
        let mut states = vec![vec![0.5]];
        states.extend(lap.iter().map(|x| vec![*x]));
        states.extend(lap.iter().map(|x| vec![x + 1.2e-8]));
        states.extend(lap.iter().map(|x| vec![*x]));
        let detector = CycleDetector::new(small_config());
        let outcome = detector.detect(scripted(states));
        assert_eq!(outcome.as_pair().1, 5.0);
    }
}
