//! Core types for whisker evaluation.
//!
//! This crate provides the foundational types shared by the simulator, the
//! evaluator and the cycle detector:
//!
//! - **Rule space**: [`Memory`], [`MemoryRange`] and the [`Whisker`] rule that
//!   maps a range of sender state to a congestion-control action
//! - **Rule trees**: [`WhiskerTree`], an arena of whiskers addressed by
//!   [`WhiskerId`], with [`UsageTally`] for per-run usage counting
//! - **Scenarios**: [`NetConfig`] for a single simulated network and
//!   [`ConfigRange`] for a sweep of them
//! - **Randomness**: the [`Prng`] every simulation draws from and the
//!   [`SeedSource`] that hands out seeds
//! - **Persistence**: the protobuf rule-tree file format in [`proto`]
//!
//! # Design Philosophy
//!
//! This crate does not depend on any other workspace crate, making it the
//! foundation layer.

mod config;
mod error;
mod memory;
pub mod proto;
mod rng;
mod tree;
mod whisker;

pub use config::{ConfigRange, NetConfig};
pub use error::TreeError;
pub use memory::{Memory, MemoryRange};
pub use rng::{seeded_prng, Prng, SeedSource};
pub use tree::{UsageTally, WhiskerId, WhiskerTree};
pub use whisker::{Whisker, MAX_WINDOW};
