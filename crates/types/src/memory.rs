//! Sender-observable state and the ranges whiskers are keyed on.

use std::fmt;

/// What a sender remembers about the acknowledgements it has seen.
///
/// Each field is one axis of the rule space: a [`Whisker`](crate::Whisker)
/// applies to every `Memory` inside its [`MemoryRange`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Memory {
    /// EWMA of the gap between send times of consecutively acknowledged packets.
    pub rec_send_ewma: f64,
    /// EWMA of the gap between arrival times of consecutive acknowledgements.
    pub rec_rec_ewma: f64,
    /// Most recent RTT divided by the minimum RTT observed in this flow.
    pub rtt_ratio: f64,
}

impl Memory {
    /// Number of axes in the rule space.
    pub const DIMENSIONS: usize = 3;

    /// Upper corner of the full rule space.
    pub const MAX: Memory = Memory {
        rec_send_ewma: 163_840.0,
        rec_rec_ewma: 163_840.0,
        rtt_ratio: 163_840.0,
    };

    pub fn new(rec_send_ewma: f64, rec_rec_ewma: f64, rtt_ratio: f64) -> Self {
        Self {
            rec_send_ewma,
            rec_rec_ewma,
            rtt_ratio,
        }
    }

    /// The axes in canonical order.
    pub fn as_array(&self) -> [f64; Self::DIMENSIONS] {
        [self.rec_send_ewma, self.rec_rec_ewma, self.rtt_ratio]
    }

    pub fn from_array(values: [f64; Self::DIMENSIONS]) -> Self {
        Self::new(values[0], values[1], values[2])
    }
}

impl fmt::Display for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(send_ewma={}, rec_ewma={}, rtt_ratio={})",
            self.rec_send_ewma, self.rec_rec_ewma, self.rtt_ratio
        )
    }
}

/// Half-open box `[lower, upper)` in the rule space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryRange {
    pub lower: Memory,
    pub upper: Memory,
}

impl Default for MemoryRange {
    /// The full rule space.
    fn default() -> Self {
        Self {
            lower: Memory::default(),
            upper: Memory::MAX,
        }
    }
}

impl MemoryRange {
    pub fn new(lower: Memory, upper: Memory) -> Self {
        Self { lower, upper }
    }

    /// Whether `memory` lies inside the range on every axis.
    pub fn contains(&self, memory: &Memory) -> bool {
        let lower = self.lower.as_array();
        let upper = self.upper.as_array();
        memory
            .as_array()
            .iter()
            .zip(lower.iter().zip(upper.iter()))
            .all(|(value, (lo, hi))| lo <= value && value < hi)
    }

    /// Whether `other` lies entirely inside this range.
    pub fn encloses(&self, other: &MemoryRange) -> bool {
        let (lower, upper) = (self.lower.as_array(), self.upper.as_array());
        let (other_lower, other_upper) = (other.lower.as_array(), other.upper.as_array());
        (0..Memory::DIMENSIONS)
            .all(|axis| lower[axis] <= other_lower[axis] && other_upper[axis] <= upper[axis])
    }

    /// Split at the midpoint of every axis into `2^DIMENSIONS` sub-ranges.
    ///
    /// The sub-ranges partition this range: every memory it contains is
    /// contained by exactly one of them.
    pub fn bisect(&self) -> Vec<MemoryRange> {
        let lower = self.lower.as_array();
        let upper = self.upper.as_array();
        let mid: Vec<f64> = lower
            .iter()
            .zip(upper.iter())
            .map(|(lo, hi)| lo + (hi - lo) / 2.0)
            .collect();

        (0..1usize << Memory::DIMENSIONS)
            .map(|mask| {
                let mut sub_lower = lower;
                let mut sub_upper = upper;
                for axis in 0..Memory::DIMENSIONS {
                    if mask & (1 << axis) != 0 {
                        sub_lower[axis] = mid[axis];
                    } else {
                        sub_upper[axis] = mid[axis];
                    }
                }
                MemoryRange::new(Memory::from_array(sub_lower), Memory::from_array(sub_upper))
            })
            .collect()
    }
}

impl fmt::Display for MemoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {})", self.lower, self.upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_range_contains_origin_but_not_max() {
        let range = MemoryRange::default();
        assert!(range.contains(&Memory::default()));
        assert!(!range.contains(&Memory::MAX));
    }

    #[test]
    fn test_bisect_partitions_range() {
        let range = MemoryRange::new(Memory::default(), Memory::new(8.0, 8.0, 8.0));
        let parts = range.bisect();
        assert_eq!(parts.len(), 8);

        for query in [
            Memory::new(0.0, 0.0, 0.0),
            Memory::new(4.0, 1.0, 7.9),
            Memory::new(3.99, 4.0, 4.0),
            Memory::new(7.5, 7.5, 7.5),
        ] {
            let holders = parts.iter().filter(|p| p.contains(&query)).count();
            assert_eq!(holders, 1, "{query} should be in exactly one half");
        }

        assert!(parts.iter().all(|p| range.encloses(p)));
    }

    #[test]
    fn test_encloses_rejects_overhang() {
        let outer = MemoryRange::new(Memory::default(), Memory::new(4.0, 4.0, 4.0));
        let inner = MemoryRange::new(Memory::new(1.0, 1.0, 1.0), Memory::new(5.0, 2.0, 2.0));
        assert!(!outer.encloses(&inner));
    }
}
