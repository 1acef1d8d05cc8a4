//! Detection of periodic steady states.
//!
//! A sender driven by a whisker tree over a single bottleneck often settles
//! into a repeating pattern. This crate finds where that pattern starts and
//! how long it lasts, for one initial condition or a whole grid of them.
//!
//! # Algorithm
//!
//! The trajectory is sampled after every sender event and each state vector
//! is projected onto an integer lattice ([`QuantizedState`]).
//!
//! 1. **Coarse scan.** Lattice points are hashed into a seen-set together
//!    with every point one unit away on each axis. A state whose hash is
//!    already in the set becomes a candidate.
//! 2. **Verification.** An identical trajectory is replayed up to the same
//!    time. Only candidate states are examined; each is looked up in a
//!    state-to-time map holding the exact lattice neighbourhoods of earlier
//!    candidates. A hit confirms a cycle `(recorded time, now - recorded)`.
//!
//! If verification finds nothing, the scan resumes with a longer horizon,
//! up to [`CycleConfig::max_attempts`] times.

mod detector;
mod grid;
mod quantize;
mod scenario;
mod trajectory;

pub use detector::{CycleConfig, CycleDetector, CycleOutcome};
pub use grid::{run_grid, GridConfig, GridPoint, GridResult};
pub use quantize::QuantizedState;
pub use scenario::CycleScenario;
pub use trajectory::Trajectory;
