//! Deterministic randomness.

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt;

/// The random stream every simulation draws from.
///
/// Cloning a `Prng` forks the stream: both copies produce the same values.
pub type Prng = ChaCha8Rng;

/// Create a [`Prng`] from a 64-bit seed.
pub fn seeded_prng(seed: u64) -> Prng {
    Prng::seed_from_u64(seed)
}

/// Process-wide source of simulation seeds.
///
/// Create one per process run and pass it to whatever needs fresh seeds.
/// Safe to share between threads; each call to [`next_seed`](Self::next_seed)
/// yields the next value of a single seeded stream.
pub struct SeedSource {
    rng: Mutex<ChaCha8Rng>,
}

impl SeedSource {
    /// Seed from operating-system entropy. Runs are not reproducible.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::from_entropy()),
        }
    }

    /// Seed deterministically. The same `seed` always yields the same sequence.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    pub fn next_seed(&self) -> u64 {
        self.rng.lock().gen()
    }
}

impl fmt::Debug for SeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedSource").finish_non_exhaustive()
    }
}
