//! Protobuf rule-tree file format.
//!
//! These types match the rule-tree schema:
//!
//! ```text
//! message WhiskerTree { MemoryRange domain = 1; repeated WhiskerTree children = 2; Whisker leaf = 3; }
//! message MemoryRange { Memory lower = 11; Memory upper = 12; }
//! message Memory      { double rec_send_ewma = 21; double rec_rec_ewma = 22; double rtt_ratio = 23; }
//! message Whisker     { sint32 window_increment = 31; double window_multiple = 32;
//!                       double intersend = 33; MemoryRange domain = 34; }
//! ```
//!
//! A node carries either a `leaf` or a non-empty list of `children`.

use crate::tree::Node;
use crate::{Memory, MemoryRange, TreeError, Whisker, WhiskerId, WhiskerTree};
use prost::Message;
use std::path::Path;
use tracing::debug;

#[derive(Clone, PartialEq, Message)]
pub struct MemoryMessage {
    #[prost(double, optional, tag = "21")]
    pub rec_send_ewma: Option<f64>,
    #[prost(double, optional, tag = "22")]
    pub rec_rec_ewma: Option<f64>,
    #[prost(double, optional, tag = "23")]
    pub rtt_ratio: Option<f64>,
}

#[derive(Clone, PartialEq, Message)]
pub struct MemoryRangeMessage {
    #[prost(message, optional, tag = "11")]
    pub lower: Option<MemoryMessage>,
    #[prost(message, optional, tag = "12")]
    pub upper: Option<MemoryMessage>,
}

#[derive(Clone, PartialEq, Message)]
pub struct WhiskerMessage {
    #[prost(sint32, optional, tag = "31")]
    pub window_increment: Option<i32>,
    #[prost(double, optional, tag = "32")]
    pub window_multiple: Option<f64>,
    #[prost(double, optional, tag = "33")]
    pub intersend: Option<f64>,
    #[prost(message, optional, tag = "34")]
    pub domain: Option<MemoryRangeMessage>,
}

#[derive(Clone, PartialEq, Message)]
pub struct WhiskerTreeMessage {
    #[prost(message, optional, tag = "1")]
    pub domain: Option<MemoryRangeMessage>,
    #[prost(message, repeated, tag = "2")]
    pub children: Vec<WhiskerTreeMessage>,
    #[prost(message, optional, tag = "3")]
    pub leaf: Option<WhiskerMessage>,
}

impl From<&Memory> for MemoryMessage {
    fn from(memory: &Memory) -> Self {
        Self {
            rec_send_ewma: Some(memory.rec_send_ewma),
            rec_rec_ewma: Some(memory.rec_rec_ewma),
            rtt_ratio: Some(memory.rtt_ratio),
        }
    }
}

impl From<&MemoryMessage> for Memory {
    fn from(msg: &MemoryMessage) -> Self {
        Memory::new(
            msg.rec_send_ewma.unwrap_or_default(),
            msg.rec_rec_ewma.unwrap_or_default(),
            msg.rtt_ratio.unwrap_or_default(),
        )
    }
}

impl From<&MemoryRange> for MemoryRangeMessage {
    fn from(range: &MemoryRange) -> Self {
        Self {
            lower: Some((&range.lower).into()),
            upper: Some((&range.upper).into()),
        }
    }
}

impl TryFrom<&MemoryRangeMessage> for MemoryRange {
    type Error = TreeError;

    fn try_from(msg: &MemoryRangeMessage) -> Result<Self, Self::Error> {
        match (&msg.lower, &msg.upper) {
            (Some(lower), Some(upper)) => Ok(MemoryRange::new(lower.into(), upper.into())),
            _ => Err(TreeError::Malformed(
                "memory range is missing a bound".to_string(),
            )),
        }
    }
}

impl From<&Whisker> for WhiskerMessage {
    fn from(whisker: &Whisker) -> Self {
        Self {
            window_increment: Some(whisker.window_increment()),
            window_multiple: Some(whisker.window_multiple()),
            intersend: Some(whisker.intersend()),
            domain: Some(whisker.domain().into()),
        }
    }
}

impl TryFrom<&WhiskerMessage> for Whisker {
    type Error = TreeError;

    fn try_from(msg: &WhiskerMessage) -> Result<Self, Self::Error> {
        let domain = msg
            .domain
            .as_ref()
            .ok_or_else(|| TreeError::Malformed("whisker has no domain".to_string()))?;
        let defaults = Whisker::new(MemoryRange::try_from(domain)?);
        let (increment, multiple, intersend) = (
            msg.window_increment.unwrap_or(defaults.window_increment()),
            msg.window_multiple.unwrap_or(defaults.window_multiple()),
            msg.intersend.unwrap_or(defaults.intersend()),
        );
        Ok(defaults.with_action(increment, multiple, intersend))
    }
}

impl WhiskerTree {
    /// Convert to the protobuf message tree.
    pub fn to_message(&self) -> WhiskerTreeMessage {
        self.node_message(0)
    }

    fn node_message(&self, index: usize) -> WhiskerTreeMessage {
        match &self.nodes[index] {
            Node::Leaf(id) => {
                let whisker = &self.whiskers[id.0 as usize];
                WhiskerTreeMessage {
                    domain: Some(whisker.domain().into()),
                    children: Vec::new(),
                    leaf: Some(whisker.into()),
                }
            }
            Node::Split { domain, children } => WhiskerTreeMessage {
                domain: Some(domain.into()),
                children: children.iter().map(|&c| self.node_message(c)).collect(),
                leaf: None,
            },
        }
    }

    /// Build a tree from its protobuf message form.
    pub fn from_message(msg: &WhiskerTreeMessage) -> Result<Self, TreeError> {
        let mut tree = WhiskerTree {
            nodes: Vec::new(),
            whiskers: Vec::new(),
            counts: Vec::new(),
        };
        tree.push_node(msg)?;
        if tree.whiskers.is_empty() {
            return Err(TreeError::EmptyTree);
        }
        Ok(tree)
    }

    fn push_node(&mut self, msg: &WhiskerTreeMessage) -> Result<usize, TreeError> {
        let index = self.nodes.len();

        if let Some(leaf) = &msg.leaf {
            let id = WhiskerId(self.whiskers.len() as u32);
            self.whiskers.push(Whisker::try_from(leaf)?);
            self.counts.push(0);
            self.nodes.push(Node::Leaf(id));
            return Ok(index);
        }

        let domain = msg
            .domain
            .as_ref()
            .ok_or_else(|| TreeError::Malformed("interior node has no domain".to_string()))
            .and_then(MemoryRange::try_from)?;
        if msg.children.is_empty() {
            return Err(TreeError::Malformed(format!(
                "interior node {domain} has neither leaf nor children"
            )));
        }

        self.nodes.push(Node::Split {
            domain,
            children: Vec::with_capacity(msg.children.len()),
        });
        let mut child_indices = Vec::with_capacity(msg.children.len());
        for child in &msg.children {
            child_indices.push(self.push_node(child)?);
        }
        if let Node::Split { children, .. } = &mut self.nodes[index] {
            *children = child_indices;
        }
        Ok(index)
    }

    /// Encode as a protobuf byte string.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_message().encode_to_vec()
    }

    /// Decode from a protobuf byte string.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TreeError> {
        let msg = WhiskerTreeMessage::decode(bytes)?;
        Self::from_message(&msg)
    }

    /// Read a rule-tree file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TreeError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| TreeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let tree = Self::from_bytes(&bytes)?;
        debug!(path = %path.display(), whiskers = tree.len(), "Loaded rule tree");
        Ok(tree)
    }

    /// Write a rule-tree file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TreeError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_bytes()).map_err(|source| TreeError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> WhiskerTree {
        let domain = MemoryRange::default();
        let whiskers = domain
            .bisect()
            .into_iter()
            .enumerate()
            .map(|(i, d)| Whisker::new(d).with_action(i as i32 - 3, 0.5 + i as f64, 0.1 * i as f64))
            .collect();
        WhiskerTree::from_leaves(domain, whiskers).unwrap()
    }

    #[test]
    fn test_bytes_round_trip() {
        let tree = sample_tree();
        let decoded = WhiskerTree::from_bytes(&tree.to_bytes()).unwrap();
        assert_eq!(decoded, tree);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.dna");
        let tree = sample_tree();
        tree.save(&path).unwrap();
        assert_eq!(WhiskerTree::load(&path).unwrap(), tree);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.dna");
        let err = WhiskerTree::load(&path).unwrap_err();
        assert!(matches!(err, TreeError::Io { .. }));
        assert!(err.to_string().contains("absent.dna"));
    }

    #[test]
    fn test_garbage_fails_to_decode() {
        let err = WhiskerTree::from_bytes(&[0xff, 0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(err, TreeError::Decode(_)));
    }

    #[test]
    fn test_empty_message_is_rejected() {
        let err = WhiskerTree::from_bytes(&[]).unwrap_err();
        assert!(matches!(err, TreeError::Malformed(_)));
    }

    #[test]
    fn test_nested_tree_lookup_after_decode() {
        let outer = MemoryRange::default();
        let halves = outer.bisect();
        let nested = WhiskerTreeMessage {
            domain: Some((&outer).into()),
            children: halves
                .iter()
                .map(|half| WhiskerTreeMessage {
                    domain: Some(half.into()),
                    children: half
                        .bisect()
                        .iter()
                        .map(|quarter| WhiskerTreeMessage {
                            domain: Some(quarter.into()),
                            children: Vec::new(),
                            leaf: Some((&Whisker::new(*quarter)).into()),
                        })
                        .collect(),
                    leaf: None,
                })
                .collect(),
            leaf: None,
        };

        let tree = WhiskerTree::from_message(&nested).unwrap();
        assert_eq!(tree.len(), 64);

        let query = Memory::new(10.0, 90_000.0, 150_000.0);
        let id = tree.lookup(&query).unwrap();
        assert!(tree.whisker(id).unwrap().domain().contains(&query));
        assert_eq!(tree.to_message(), nested);
    }
}
