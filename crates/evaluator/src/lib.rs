//! Deterministic scoring of whisker trees.
//!
//! An [`Evaluator`] expands a [`ConfigRange`](whisker_types::ConfigRange)
//! into a log-spaced sweep of link speeds, freezes one random seed, and then
//! scores candidate rule changes by simulating every configuration in the
//! sweep. Two `score` calls with the same inputs return bit-identical
//! outcomes, so a search driver comparing candidates only ever sees the
//! effect of the rules it changed.

mod error;
mod evaluator;
mod sampler;

pub use error::EvaluatorError;
pub use evaluator::{Evaluator, EvaluatorConfig, Outcome};
pub use sampler::sample_configs;
