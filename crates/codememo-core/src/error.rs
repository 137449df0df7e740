//! Error types for Codememo.
//!
//! Every failure the graph can report falls into one of three kinds:
//! an edge that cannot be created, a removal whose precondition does not
//! hold, or a document that cannot be loaded. None of them is fatal; the
//! graph is left untouched whenever one is returned.

use std::path::PathBuf;
use thiserror::Error;

/// An edge could not be created.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    #[error(
        "reference range {ref_start}..{} should be in the range [1, {n_lines}]",
        .ref_stop.map(|v| v.to_string()).unwrap_or_default()
    )]
    OutOfRange {
        ref_start: u32,
        ref_stop: Option<u32>,
        n_lines: u32,
    },

    #[error("Duplicate reference: {root} is already a root of {leaf}")]
    Duplicate { root: String, leaf: String },

    #[error("node {0} is not in this collection")]
    UnknownNode(String),

    #[error("node {0} is already in this collection")]
    DuplicateNode(String),

    #[error("node {0} still carries edges and cannot be added")]
    AttachedNode(String),
}

/// A removal precondition failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemovalError {
    #[error("{leaf} is not a leaf of {root}")]
    NotALeaf { root: String, leaf: String },

    #[error("node {0} is not in this collection")]
    NotMember(String),

    #[error("node {node} has {count} remaining leaves, they must be detached first")]
    RemainingLeaves { node: String, count: usize },

    #[error("node {0} has no root")]
    NoRoots(String),

    #[error("{root} is not a root of {target}")]
    NotARoot { target: String, root: String },
}

/// A persisted document could not be turned back into a graph.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("node {leaf} lists {root} as a root but records no reference info for it")]
    MissingReferenceInfo { root: String, leaf: String },

    #[error("node {node} refers to unknown node {reference}")]
    UnknownReference { node: String, reference: String },

    #[error("Corrupted document at node {node}: {reason}")]
    Corrupted { node: String, reason: String },

    #[error("Invalid reference in document: {0}")]
    Reference(#[from] ReferenceError),

    #[error("DOT parse error: {0}")]
    Dot(String),
}

/// Any error raised by Codememo.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Removal(#[from] RemovalError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let err = ReferenceError::OutOfRange {
            ref_start: 0,
            ref_stop: None,
            n_lines: 2,
        };
        assert!(err.to_string().contains("should be in the range [1, 2]"));
    }

    #[test]
    fn test_umbrella_conversion() {
        let err: Error = RemovalError::NoRoots("a".to_string()).into();
        assert!(matches!(err, Error::Removal(RemovalError::NoRoots(_))));
    }
}
