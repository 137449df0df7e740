//! Rebuilding a collection from recorded nodes.
//!
//! Nodes read from a document carry their edges as recorded lists. The
//! builder handles the two-pass process:
//! 1. Add all nodes to the collection, detached
//! 2. Replay every recorded leaf edge with its recorded reference range
//!
//! Afterwards the replayed roots and leaves must match what was recorded;
//! any difference means the document is corrupted.

use crate::collection::NodeCollection;
use crate::node::{Node, NodeId, RecordedEdges};
use codememo_core::LoadError;
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::debug;

/// Builds a `NodeCollection` from nodes that carry recorded edges.
#[derive(Debug, Default)]
pub struct CollectionBuilder {
    collection: NodeCollection,
    /// Edges as recorded, in node order.
    recorded: IndexMap<NodeId, RecordedEdges>,
}

impl CollectionBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds recorded nodes, keeping their order.
    ///
    /// Call this for every node, then `build` once all are added.
    pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = Node>) -> Result<(), LoadError> {
        for mut node in nodes {
            let edges = node.take_edges();
            let id = self.collection.add_node(node)?;
            self.recorded.insert(id, edges);
        }
        Ok(())
    }

    /// Replays every recorded leaf edge.
    fn resolve_edges(&mut self) -> Result<(), LoadError> {
        let mut replayed = 0usize;

        for (root, edges) in &self.recorded {
            for leaf in &edges.leaves {
                let leaf_edges =
                    self.recorded
                        .get(leaf)
                        .ok_or_else(|| LoadError::UnknownReference {
                            node: root.to_string(),
                            reference: leaf.to_string(),
                        })?;
                let info = leaf_edges.ref_infos.get(root).ok_or_else(|| {
                    LoadError::MissingReferenceInfo {
                        root: root.to_string(),
                        leaf: leaf.to_string(),
                    }
                })?;
                self.collection
                    .add_leaf_reference(*root, *leaf, info.ref_start, info.ref_stop)?;
                replayed += 1;
            }
        }

        debug!(
            nodes = self.recorded.len(),
            edges = replayed,
            "replayed recorded edges"
        );
        Ok(())
    }

    /// Checks the replay against the record and restores recorded root order.
    fn reconcile(&mut self) -> Result<(), LoadError> {
        for (id, edges) in &self.recorded {
            let corrupted = |reason: &str| LoadError::Corrupted {
                node: id.to_string(),
                reason: reason.to_string(),
            };

            for root in &edges.roots {
                if !self.collection.contains(*root) {
                    return Err(LoadError::UnknownReference {
                        node: id.to_string(),
                        reference: root.to_string(),
                    });
                }
            }

            let node = self
                .collection
                .get_mut(*id)
                .ok_or_else(|| corrupted("node vanished during replay"))?;

            let recorded_roots: HashSet<NodeId> = edges.roots.iter().copied().collect();
            let replayed_roots: HashSet<NodeId> = node.roots().iter().copied().collect();
            if recorded_roots.len() != edges.roots.len() {
                return Err(corrupted("a root is listed twice"));
            }
            if recorded_roots != replayed_roots {
                return Err(corrupted("recorded roots do not match the leaves of other nodes"));
            }
            if node.leaves() != edges.leaves.as_slice() {
                return Err(corrupted("recorded leaves do not match the replay"));
            }
            let recorded_keys: HashSet<NodeId> = edges.ref_infos.keys().copied().collect();
            if recorded_keys != recorded_roots {
                return Err(corrupted("reference infos do not match the recorded roots"));
            }

            node.reorder_roots(&edges.roots);
        }
        Ok(())
    }

    /// Finishes building and returns the collection.
    pub fn build(mut self) -> Result<NodeCollection, LoadError> {
        self.resolve_edges()?;
        self.reconcile()?;
        Ok(self.collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codememo_core::{ReferenceError, Snippet};

    fn linked_pair() -> (Node, Node) {
        let mut collection = NodeCollection::new();
        let a = collection.add_node(Node::new(Snippet::new("a", "1\n2\n3"))).unwrap();
        let b = collection.add_node(Node::new(Snippet::new("b", "1\n2"))).unwrap();
        collection.add_leaf_reference(a, b, 2, None).unwrap();
        (
            collection.get(a).unwrap().clone(),
            collection.get(b).unwrap().clone(),
        )
    }

    #[test]
    fn test_builder_replays_edges() {
        let (a, b) = linked_pair();
        let mut builder = CollectionBuilder::new();
        builder.add_nodes(vec![a.clone(), b.clone()]).unwrap();
        let collection = builder.build().unwrap();

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.edge_count(), 1);
        assert_eq!(collection.get(a.id()), Some(&a));
        assert_eq!(collection.get(b.id()), Some(&b));
    }

    #[test]
    fn test_builder_restores_root_order() {
        let mut collection = NodeCollection::new();
        let a = collection.add_node(Node::new(Snippet::new("a", "x"))).unwrap();
        let b = collection.add_node(Node::new(Snippet::new("b", "x"))).unwrap();
        let c = collection.add_node(Node::new(Snippet::new("c", "x"))).unwrap();
        // c gets b as its first root although b comes after a.
        collection.add_leaf(b, c).unwrap();
        collection.add_leaf(a, c).unwrap();

        let mut builder = CollectionBuilder::new();
        builder.add_nodes(collection.nodes().cloned()).unwrap();
        let rebuilt = builder.build().unwrap();

        assert_eq!(rebuilt.get(c).unwrap().roots(), &[b, a]);
        assert_eq!(rebuilt, collection);
    }

    #[test]
    fn test_builder_rejects_missing_reference_info() {
        let (a, mut b) = linked_pair();
        b.ref_infos.clear();
        let mut builder = CollectionBuilder::new();
        builder.add_nodes(vec![a, b]).unwrap();
        assert!(matches!(
            builder.build(),
            Err(LoadError::MissingReferenceInfo { .. })
        ));
    }

    #[test]
    fn test_builder_rejects_unknown_leaf() {
        let (a, _) = linked_pair();
        let mut builder = CollectionBuilder::new();
        builder.add_nodes(vec![a]).unwrap();
        assert!(matches!(
            builder.build(),
            Err(LoadError::UnknownReference { .. })
        ));
    }

    #[test]
    fn test_builder_rejects_one_sided_root() {
        let (mut a, b) = linked_pair();
        a.leaves.clear();
        let mut builder = CollectionBuilder::new();
        builder.add_nodes(vec![a, b]).unwrap();
        assert!(matches!(builder.build(), Err(LoadError::Corrupted { .. })));
    }

    #[test]
    fn test_builder_rejects_out_of_range_reference() {
        let (a, mut b) = linked_pair();
        b.ref_infos.insert(a.id(), codememo_core::ReferenceInfo::new(9, None));
        let mut builder = CollectionBuilder::new();
        builder.add_nodes(vec![a, b]).unwrap();
        assert!(matches!(
            builder.build(),
            Err(LoadError::Reference(ReferenceError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_builder_rejects_duplicate_ids() {
        let (a, _) = linked_pair();
        let mut builder = CollectionBuilder::new();
        let result = builder.add_nodes(vec![a.clone(), a]);
        assert!(matches!(
            result,
            Err(LoadError::Reference(ReferenceError::DuplicateNode(_)))
        ));
    }
}
