//! Rule trees stored as flat arenas.
//!
//! A [`WhiskerTree`] keeps its whiskers in one table addressed by
//! [`WhiskerId`] and its interior structure in another. Cloning a tree is
//! therefore two vector copies, and usage counting can happen outside the
//! tree in a [`UsageTally`] keyed by the same ids. Simulations share a tree
//! read-only and fold their tallies back in afterwards.

use crate::{Memory, MemoryRange, TreeError, Whisker};

/// Stable index of a whisker within one [`WhiskerTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WhiskerId(pub u32);

impl WhiskerId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Leaf(WhiskerId),
    Split {
        domain: MemoryRange,
        children: Vec<usize>,
    },
}

/// A congestion-control policy: whiskers partitioning the rule space.
///
/// Node 0 is the root. Lookups descend from the root into the first child
/// whose domain contains the query.
#[derive(Debug, Clone, PartialEq)]
pub struct WhiskerTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) whiskers: Vec<Whisker>,
    pub(crate) counts: Vec<u64>,
}

impl Default for WhiskerTree {
    /// A single default whisker covering the full rule space.
    fn default() -> Self {
        Self {
            nodes: vec![Node::Leaf(WhiskerId(0))],
            whiskers: vec![Whisker::new(MemoryRange::default())],
            counts: vec![0],
        }
    }
}

impl WhiskerTree {
    /// Build a one-level tree over `domain` whose children are `whiskers`.
    ///
    /// Every whisker's domain must lie inside `domain`.
    pub fn from_leaves(domain: MemoryRange, whiskers: Vec<Whisker>) -> Result<Self, TreeError> {
        if whiskers.is_empty() {
            return Err(TreeError::EmptyTree);
        }
        if let Some(stray) = whiskers.iter().find(|w| !domain.encloses(w.domain())) {
            return Err(TreeError::Malformed(format!(
                "whisker domain {} lies outside tree domain {}",
                stray.domain(),
                domain
            )));
        }

        let mut nodes = Vec::with_capacity(whiskers.len() + 1);
        nodes.push(Node::Split {
            domain,
            children: (1..=whiskers.len()).collect(),
        });
        nodes.extend((0..whiskers.len()).map(|i| Node::Leaf(WhiskerId(i as u32))));

        Ok(Self {
            nodes,
            counts: vec![0; whiskers.len()],
            whiskers,
        })
    }

    /// Domain covered by the whole tree.
    pub fn domain(&self) -> &MemoryRange {
        self.node_domain(0).unwrap_or_else(|| self.whiskers[0].domain())
    }

    fn node_domain(&self, index: usize) -> Option<&MemoryRange> {
        match self.nodes.get(index)? {
            Node::Leaf(id) => self.whisker(*id).map(Whisker::domain),
            Node::Split { domain, .. } => Some(domain),
        }
    }

    /// Find the whisker whose domain contains `memory`.
    ///
    /// Returns `None` if `memory` falls outside the tree's domain.
    pub fn lookup(&self, memory: &Memory) -> Option<WhiskerId> {
        let mut index = 0;
        loop {
            match self.nodes.get(index)? {
                Node::Leaf(id) => {
                    return self
                        .whisker(*id)
                        .filter(|w| w.domain().contains(memory))
                        .map(|_| *id);
                }
                Node::Split { domain, children } => {
                    if !domain.contains(memory) {
                        return None;
                    }
                    index = *children.iter().find(|&&child| {
                        self.node_domain(child)
                            .is_some_and(|d| d.contains(memory))
                    })?;
                }
            }
        }
    }

    pub fn whisker(&self, id: WhiskerId) -> Option<&Whisker> {
        self.whiskers.get(id.index())
    }

    /// All whiskers with their ids, in id order.
    pub fn whiskers(&self) -> impl Iterator<Item = (WhiskerId, &Whisker)> {
        self.whiskers
            .iter()
            .enumerate()
            .map(|(i, w)| (WhiskerId(i as u32), w))
    }

    pub fn len(&self) -> usize {
        self.whiskers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.whiskers.is_empty()
    }

    /// Overwrite the whisker whose domain equals `replacement`'s.
    ///
    /// Returns `false` if no whisker has that domain; the tree is unchanged.
    pub fn replace(&mut self, replacement: Whisker) -> bool {
        match self
            .whiskers
            .iter_mut()
            .find(|w| w.domain() == replacement.domain())
        {
            Some(slot) => {
                *slot = replacement;
                true
            }
            None => false,
        }
    }

    /// How many times the whisker has been used since the last reset.
    pub fn count(&self, id: WhiskerId) -> u64 {
        self.counts.get(id.index()).copied().unwrap_or(0)
    }

    pub fn total_count(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn reset_counts(&mut self) {
        self.counts.iter_mut().for_each(|c| *c = 0);
    }

    /// A zeroed tally sized for this tree.
    pub fn new_tally(&self) -> UsageTally {
        UsageTally::new(self.len())
    }

    /// Add a tally gathered against this tree to its usage counts.
    pub fn record_usage(&mut self, tally: &UsageTally) {
        for (count, used) in self.counts.iter_mut().zip(tally.counts.iter()) {
            *count += used;
        }
    }
}

/// Per-whisker usage counts gathered outside a tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UsageTally {
    counts: Vec<u64>,
}

impl UsageTally {
    pub fn new(len: usize) -> Self {
        Self {
            counts: vec![0; len],
        }
    }

    pub fn record(&mut self, id: WhiskerId) {
        if let Some(count) = self.counts.get_mut(id.index()) {
            *count += 1;
        }
    }

    pub fn get(&self, id: WhiskerId) -> u64 {
        self.counts.get(id.index()).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Fold another tally for the same tree into this one.
    pub fn merge(&mut self, other: &UsageTally) {
        if self.counts.len() < other.counts.len() {
            self.counts.resize(other.counts.len(), 0);
        }
        for (count, used) in self.counts.iter_mut().zip(other.counts.iter()) {
            *count += used;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quartered_tree() -> WhiskerTree {
        let domain = MemoryRange::default();
        let whiskers = domain.bisect().into_iter().map(Whisker::new).collect();
        WhiskerTree::from_leaves(domain, whiskers).unwrap()
    }

    #[test]
    fn test_default_tree_covers_everything() {
        let tree = WhiskerTree::default();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.lookup(&Memory::default()), Some(WhiskerId(0)));
        assert_eq!(tree.lookup(&Memory::new(1.0, 2.0, 3.0)), Some(WhiskerId(0)));
        assert_eq!(tree.lookup(&Memory::MAX), None);
    }

    #[test]
    fn test_lookup_finds_containing_leaf() {
        let tree = quartered_tree();
        let query = Memory::new(1.0, 100_000.0, 1.0);
        let id = tree.lookup(&query).expect("query inside domain");
        assert!(tree.whisker(id).unwrap().domain().contains(&query));
    }

    #[test]
    fn test_replace_is_keyed_by_domain() {
        let mut tree = quartered_tree();
        let target = tree.whisker(WhiskerId(3)).unwrap().clone();
        let replacement = target.clone().with_action(7, 0.5, 0.25);

        assert!(tree.replace(replacement.clone()));
        assert_eq!(tree.whisker(WhiskerId(3)), Some(&replacement));

        let stranger = Whisker::new(MemoryRange::new(
            Memory::default(),
            Memory::new(1.0, 1.0, 1.0),
        ));
        let before = tree.clone();
        assert!(!tree.replace(stranger));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_usage_tally_round_trip() {
        let mut tree = quartered_tree();
        let mut tally = tree.new_tally();
        tally.record(WhiskerId(2));
        tally.record(WhiskerId(2));
        tally.record(WhiskerId(5));

        let mut other = tree.new_tally();
        other.record(WhiskerId(2));
        tally.merge(&other);

        tree.record_usage(&tally);
        assert_eq!(tree.count(WhiskerId(2)), 3);
        assert_eq!(tree.count(WhiskerId(5)), 1);
        assert_eq!(tree.total_count(), 4);

        tree.reset_counts();
        assert_eq!(tree.total_count(), 0);
    }

    #[test]
    fn test_from_leaves_rejects_bad_input() {
        assert!(matches!(
            WhiskerTree::from_leaves(MemoryRange::default(), Vec::new()),
            Err(TreeError::EmptyTree)
        ));

        let small = MemoryRange::new(Memory::default(), Memory::new(1.0, 1.0, 1.0));
        let result = WhiskerTree::from_leaves(small, vec![Whisker::new(MemoryRange::default())]);
        assert!(matches!(result, Err(TreeError::Malformed(_))));
    }
}
