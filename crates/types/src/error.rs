//! Errors raised while building, reading or writing rule trees.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from rule-tree construction and the rule-tree file format.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("failed to access rule tree file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse rule tree: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("malformed rule tree: {0}")]
    Malformed(String),

    #[error("rule tree contains no whiskers")]
    EmptyTree,
}
