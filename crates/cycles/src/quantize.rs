use xxhash_rust::xxh3::xxh3_64;

/// A state vector projected onto an integer lattice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuantizedState(Vec<i64>);

impl QuantizedState {
    /// Scale every coordinate by `quantizer` and truncate toward zero.
    pub fn from_exact(state: &[f64], quantizer: f64) -> Self {
        Self(state.iter().map(|x| (x * quantizer) as i64).collect())
    }

    pub fn coordinates(&self) -> &[i64] {
        &self.0
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// Stable 64-bit hash of the lattice coordinates.
    pub fn hash_value(&self) -> u64 {
        let bytes: Vec<u8> = self.0.iter().flat_map(|c| c.to_le_bytes()).collect();
        xxh3_64(&bytes)
    }

    /// Every lattice point within one unit of this one on each axis,
    /// including this point itself: `3^d` states for dimension `d`.
    pub fn fuzz(&self) -> Vec<QuantizedState> {
        let mut states = vec![self.clone()];
        for axis in 0..self.0.len() {
            let mut next = Vec::with_capacity(states.len() * 3);
            for state in states {
                let mut up = state.clone();
                let mut down = state.clone();
                up.0[axis] = up.0[axis].saturating_add(1);
                down.0[axis] = down.0[axis].saturating_sub(1);
                next.push(state);
                next.push(up);
                next.push(down);
            }
            states = next;
        }
        states
    }
}

impl From<Vec<i64>> for QuantizedState {
    fn from(coordinates: Vec<i64>) -> Self {
        Self(coordinates)
    }
}
