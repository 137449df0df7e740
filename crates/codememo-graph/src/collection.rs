//! The node collection.
//!
//! `NodeCollection` owns every node of a graph, keyed by id in insertion
//! order. It is the only place edges are created or removed, so the two
//! sides of an edge (`root.leaves` and `leaf.roots` plus `leaf.ref_infos`)
//! are always updated together. Each mutation checks all of its
//! preconditions before touching anything.

use crate::link::{IndexLink, Link};
use crate::node::{Node, NodeId};
use codememo_core::{LoadError, ReferenceError, ReferenceInfo, RemovalError};
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::{debug, trace};

/// The reference graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeCollection {
    nodes: IndexMap<NodeId, Node>,
}

impl NodeCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collection from detached nodes, keeping their order.
    pub fn with_nodes(nodes: impl IntoIterator<Item = Node>) -> Result<Self, ReferenceError> {
        let mut collection = Self::new();
        for node in nodes {
            collection.add_node(node)?;
        }
        Ok(collection)
    }

    /// Adds a detached node to the end of the collection.
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, ReferenceError> {
        let id = node.id();
        if self.nodes.contains_key(&id) {
            return Err(ReferenceError::DuplicateNode(id.to_string()));
        }
        if !node.is_detached() {
            return Err(ReferenceError::AttachedNode(id.to_string()));
        }
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Gets a node by id.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Gets a node by id for editing its snippet or comment.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Gets a node by its position in the collection.
    pub fn get_index(&self, index: usize) -> Option<&Node> {
        self.nodes.get_index(index).map(|(_, node)| node)
    }

    /// Position of a node in the collection.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.nodes.get_index_of(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Iterates over all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Iterates over all node ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|node| node.leaves().len()).sum()
    }

    /// Finds all nodes whose snippet has the given name.
    pub fn find_by_name(&self, name: &str) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|node| node.snippet.name == name)
            .collect()
    }

    /// Finds all node ids starting with `prefix` (hyphenated form).
    pub fn find_by_prefix(&self, prefix: &str) -> Vec<NodeId> {
        let prefix = prefix.to_lowercase();
        self.nodes
            .keys()
            .filter(|id| id.to_string().starts_with(&prefix))
            .copied()
            .collect()
    }

    fn node(&self, id: NodeId) -> Result<&Node, ReferenceError> {
        self.nodes
            .get(&id)
            .ok_or_else(|| ReferenceError::UnknownNode(id.to_string()))
    }

    /// Makes `leaf` refer to the first line of `root`.
    pub fn add_leaf(&mut self, root: NodeId, leaf: NodeId) -> Result<(), ReferenceError> {
        self.add_leaf_reference(root, leaf, 1, None)
    }

    /// Makes `leaf` refer to lines `ref_start..=ref_stop` through `root`.
    ///
    /// The range is checked against the leaf's snippet. Adding the same
    /// root to a leaf twice fails; a node may be its own root once.
    /// Cycles are allowed.
    pub fn add_leaf_reference(
        &mut self,
        root: NodeId,
        leaf: NodeId,
        ref_start: u32,
        ref_stop: Option<u32>,
    ) -> Result<(), ReferenceError> {
        self.node(root)?;
        let leaf_node = self.node(leaf)?;

        let info = ReferenceInfo::checked(ref_start, ref_stop, leaf_node.snippet.n_lines())?;
        if leaf_node.roots().contains(&root) {
            return Err(ReferenceError::Duplicate {
                root: root.to_string(),
                leaf: leaf.to_string(),
            });
        }

        if let Some(leaf_node) = self.nodes.get_mut(&leaf) {
            leaf_node.attach_root(root, info);
        }
        if let Some(root_node) = self.nodes.get_mut(&root) {
            root_node.attach_leaf(leaf);
        }
        trace!(%root, %leaf, ref_start, ?ref_stop, "added leaf reference");
        Ok(())
    }

    /// Removes the edge from `root` to `leaf`.
    pub fn remove_leaf(&mut self, root: NodeId, leaf: NodeId) -> Result<(), RemovalError> {
        let root_node = self
            .nodes
            .get(&root)
            .ok_or_else(|| RemovalError::NotMember(root.to_string()))?;
        if !root_node.leaves().contains(&leaf) {
            return Err(RemovalError::NotALeaf {
                root: root.to_string(),
                leaf: leaf.to_string(),
            });
        }

        if let Some(root_node) = self.nodes.get_mut(&root) {
            root_node.detach_leaf(leaf);
        }
        if let Some(leaf_node) = self.nodes.get_mut(&leaf) {
            leaf_node.detach_root(root);
        }
        trace!(%root, %leaf, "removed leaf");
        Ok(())
    }

    /// Removes every edge going out of `root`.
    pub fn remove_all_leaves(&mut self, root: NodeId) -> Result<(), RemovalError> {
        let leaves = self
            .nodes
            .get(&root)
            .ok_or_else(|| RemovalError::NotMember(root.to_string()))?
            .leaves()
            .to_vec();
        for leaf in leaves {
            self.remove_leaf(root, leaf)?;
        }
        Ok(())
    }

    /// Removes `root` from the roots of `target`.
    pub fn remove_root_reference(
        &mut self,
        target: NodeId,
        root: NodeId,
    ) -> Result<(), RemovalError> {
        let target_node = self
            .nodes
            .get(&target)
            .ok_or_else(|| RemovalError::NotMember(target.to_string()))?;
        if target_node.roots().is_empty() {
            return Err(RemovalError::NoRoots(target.to_string()));
        }
        if !target_node.roots().contains(&root) {
            return Err(RemovalError::NotARoot {
                target: target.to_string(),
                root: root.to_string(),
            });
        }
        self.remove_leaf(root, target)
    }

    /// Removes a node that has no leaves left, detaching it from its roots.
    ///
    /// Returns the removed node.
    pub fn remove_node(&mut self, target: NodeId) -> Result<Node, RemovalError> {
        let target_node = self
            .nodes
            .get(&target)
            .ok_or_else(|| RemovalError::NotMember(target.to_string()))?;
        if !target_node.leaves().is_empty() {
            return Err(RemovalError::RemainingLeaves {
                node: target.to_string(),
                count: target_node.leaves().len(),
            });
        }

        for root in target_node.roots().to_vec() {
            self.remove_leaf(root, target)?;
        }
        self.nodes
            .shift_remove(&target)
            .ok_or_else(|| RemovalError::NotMember(target.to_string()))
    }

    /// Removes `target` and every node reachable from it through leaves.
    ///
    /// Returns the removed nodes, detached, in collection order.
    pub fn remove_node_and_its_leaves(
        &mut self,
        target: NodeId,
    ) -> Result<Vec<Node>, RemovalError> {
        if !self.contains(target) {
            return Err(RemovalError::NotMember(target.to_string()));
        }

        let doomed = self.reachable_leaves(target);

        // Anything pointing into the doomed set is either inside it or one
        // of its roots, so detaching every member's roots clears all edges.
        let members: Vec<NodeId> = self.ids().filter(|id| doomed.contains(id)).collect();
        for member in &members {
            let roots = self
                .nodes
                .get(member)
                .map(|node| node.roots().to_vec())
                .unwrap_or_default();
            for root in roots {
                if let Some(root_node) = self.nodes.get_mut(&root) {
                    root_node.detach_leaf(*member);
                }
            }
        }

        let mut removed = Vec::with_capacity(members.len());
        for member in members {
            if let Some(mut node) = self.nodes.shift_remove(&member) {
                node.take_edges();
                removed.push(node);
            }
        }
        debug!(%target, count = removed.len(), "removed node and its leaves");
        Ok(removed)
    }

    /// All nodes reachable from `start` through leaves, `start` included.
    pub fn reachable_leaves(&self, start: NodeId) -> HashSet<NodeId> {
        let mut visited = HashSet::new();
        let mut stack = vec![start];

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.leaves().iter().filter(|id| !visited.contains(*id)));
            }
        }

        visited
    }

    /// Builds a link for the edge `root -> leaf`.
    pub(crate) fn link(&self, root: &Node, leaf_slot: usize, leaf: NodeId) -> Option<Link> {
        let root_slot = self.nodes.get(&leaf)?.root_slot(root.id())?;
        Some(Link::new(root.id(), root_slot, leaf, leaf_slot))
    }

    /// Links for every edge of `node`, in leaf order.
    pub(crate) fn links_of<'a>(&'a self, node: &'a Node) -> impl Iterator<Item = Link> + 'a {
        node.leaves()
            .iter()
            .enumerate()
            .filter_map(move |(leaf_slot, leaf)| self.link(node, leaf_slot, *leaf))
    }

    /// Returns a link for every edge, grouped by root in collection order.
    pub fn resolve_links(&self) -> Vec<Link> {
        self.nodes
            .values()
            .flat_map(|node| self.links_of(node))
            .collect()
    }

    /// Same as `resolve_links`, with nodes given by collection position.
    pub fn resolve_index_links(&self) -> Vec<IndexLink> {
        self.resolve_links()
            .into_iter()
            .filter_map(|link| {
                Some(IndexLink::new(
                    self.index_of(link.root)?,
                    link.root_slot,
                    self.index_of(link.leaf)?,
                    link.leaf_slot,
                ))
            })
            .collect()
    }

    /// Checks the edge bookkeeping of every node.
    ///
    /// Holds after any sequence of successful mutations; a failure means
    /// the collection was built from a corrupted source.
    pub fn verify(&self) -> Result<(), LoadError> {
        let corrupted = |node: NodeId, reason: String| LoadError::Corrupted {
            node: node.to_string(),
            reason,
        };

        for node in self.nodes.values() {
            let id = node.id();

            let mut seen = HashSet::new();
            for root in node.roots() {
                if !seen.insert(*root) {
                    return Err(corrupted(id, format!("root {root} is listed twice")));
                }
                let root_node = self.nodes.get(root).ok_or_else(|| LoadError::UnknownReference {
                    node: id.to_string(),
                    reference: root.to_string(),
                })?;
                if !root_node.leaves().contains(&id) {
                    return Err(corrupted(id, format!("root {root} does not list it as a leaf")));
                }
                let info = node.ref_info(*root).ok_or_else(|| LoadError::MissingReferenceInfo {
                    root: root.to_string(),
                    leaf: id.to_string(),
                })?;
                ReferenceInfo::checked(info.ref_start, info.ref_stop, node.snippet.n_lines())?;
            }
            if node.ref_infos().count() != node.roots().len() {
                return Err(corrupted(id, "reference info without a matching root".into()));
            }

            let mut seen = HashSet::new();
            for leaf in node.leaves() {
                if !seen.insert(*leaf) {
                    return Err(corrupted(id, format!("leaf {leaf} is listed twice")));
                }
                let leaf_node = self.nodes.get(leaf).ok_or_else(|| LoadError::UnknownReference {
                    node: id.to_string(),
                    reference: leaf.to_string(),
                })?;
                if !leaf_node.roots().contains(&id) {
                    return Err(corrupted(id, format!("leaf {leaf} does not list it as a root")));
                }
            }
        }
        Ok(())
    }
}
