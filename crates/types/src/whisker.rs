//! A single congestion-control rule.

use crate::MemoryRange;

/// Largest congestion window a whisker can produce.
pub const MAX_WINDOW: u32 = 1_000_000;

const DEFAULT_WINDOW_INCREMENT: i32 = 1;
const DEFAULT_WINDOW_MULTIPLE: f64 = 1.0;
const DEFAULT_INTERSEND_MS: f64 = 3.0;

/// Maps a region of sender state to a window update and a pacing interval.
///
/// Whiskers are identified by their domain: replacing a whisker in a
/// [`WhiskerTree`](crate::WhiskerTree) overwrites the one with an equal domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Whisker {
    domain: MemoryRange,
    window_increment: i32,
    window_multiple: f64,
    intersend: f64,
}

impl Whisker {
    /// Create a whisker over `domain` with the default action.
    pub fn new(domain: MemoryRange) -> Self {
        Self {
            domain,
            window_increment: DEFAULT_WINDOW_INCREMENT,
            window_multiple: DEFAULT_WINDOW_MULTIPLE,
            intersend: DEFAULT_INTERSEND_MS,
        }
    }

    /// Replace the action, keeping the domain.
    pub fn with_action(mut self, window_increment: i32, window_multiple: f64, intersend: f64) -> Self {
        self.window_increment = window_increment;
        self.window_multiple = window_multiple;
        self.intersend = intersend;
        self
    }

    pub fn domain(&self) -> &MemoryRange {
        &self.domain
    }

    pub fn window_increment(&self) -> i32 {
        self.window_increment
    }

    pub fn window_multiple(&self) -> f64 {
        self.window_multiple
    }

    /// Minimum gap between two sends, in milliseconds.
    pub fn intersend(&self) -> f64 {
        self.intersend
    }

    /// Next congestion window given the previous one.
    pub fn window(&self, previous: u32) -> u32 {
        let next = f64::from(previous) * self.window_multiple + f64::from(self.window_increment);
        next.clamp(0.0, f64::from(MAX_WINDOW)) as u32
    }
}
