//! Link types for connector drawing.
//!
//! Links are flattened, read-only views of one root-to-leaf edge. They are
//! derived from the collection on demand and never stored.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};

/// One edge between a root and a leaf, with slot indexes for layout.
///
/// `root_slot` is the position of the root within the leaf's roots, and
/// `leaf_slot` the position of the leaf within the root's leaves. A
/// renderer uses them to space several connectors on one box evenly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub root: NodeId,
    pub root_slot: usize,
    pub leaf: NodeId,
    pub leaf_slot: usize,
}

impl Link {
    pub fn new(root: NodeId, root_slot: usize, leaf: NodeId, leaf_slot: usize) -> Self {
        Self {
            root,
            root_slot,
            leaf,
            leaf_slot,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.root == self.leaf
    }
}

/// Same as [`Link`], but nodes are given by their position in some
/// node ordering instead of by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexLink {
    pub root: usize,
    pub root_slot: usize,
    pub leaf: usize,
    pub leaf_slot: usize,
}

impl IndexLink {
    pub fn new(root: usize, root_slot: usize, leaf: usize, leaf_slot: usize) -> Self {
        Self {
            root,
            root_slot,
            leaf,
            leaf_slot,
        }
    }
}
