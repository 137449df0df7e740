//! Forest decomposition for layout.
//!
//! `resolve_trees` splits the graph into trees of depth-ordered layers plus
//! a list of orphans. A layout consumer draws each layer as a column.
//!
//! The graph may contain cycles, self-loops and nodes with several roots,
//! so a plain tree walk is ill-defined. The decomposition repeatedly picks
//! roots among the unvisited nodes and walks their leaves depth-first with
//! one visited set shared by the whole pass: every node lands in exactly
//! one tree (or in the orphans) and the walk always terminates.

use crate::collection::NodeCollection;
use crate::link::{IndexLink, Link};
use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// One tree of the forest, as layers of equal depth.
///
/// Layer 0 holds the root alone; layer `n` holds every node first reached
/// at depth `n`, in depth-first order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    pub layers: Vec<Vec<NodeId>>,
}

impl Tree {
    pub fn root(&self) -> Option<NodeId> {
        self.layers.first().and_then(|layer| layer.first()).copied()
    }

    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// All nodes of the tree, layer by layer.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.layers.iter().flatten().copied()
    }

    pub fn len(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Result of `resolve_trees`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forest {
    pub trees: Vec<Tree>,
    /// Nodes with neither roots nor leaves.
    pub orphans: Vec<NodeId>,
}

impl Forest {
    /// Every node placed in a tree, tree by tree, layer by layer.
    pub fn tree_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.trees.iter().flat_map(Tree::nodes)
    }
}

/// A node reached by the depth-first walk, and the depth it was reached at.
#[derive(Debug, Clone, Copy)]
struct Visit {
    node: NodeId,
    depth: usize,
}

impl NodeCollection {
    /// Splits the graph into layered trees and orphans.
    ///
    /// Roots are unvisited nodes none of whose roots are still unvisited.
    /// When only cycles remain, the first remaining node in collection order
    /// becomes an artificial root. Which node of a pure cycle ends up as
    /// root therefore depends on insertion order.
    pub fn resolve_trees(&self) -> Forest {
        let mut forest = Forest::default();
        let mut visited: HashSet<NodeId> = HashSet::with_capacity(self.len());

        while visited.len() < self.len() {
            let remaining: Vec<NodeId> = self.ids().filter(|id| !visited.contains(id)).collect();

            let mut roots = Vec::new();
            for id in &remaining {
                let Some(node) = self.get(*id) else { continue };
                if node.roots().iter().any(|root| !visited.contains(root)) {
                    continue;
                }
                if node.roots().is_empty() && node.leaves().is_empty() {
                    visited.insert(*id);
                    forest.orphans.push(*id);
                } else {
                    roots.push(*id);
                }
            }

            if roots.is_empty() {
                // Everything left sits on a cycle or hangs below one.
                // Prefer a node with leaves still to walk.
                let unvisited: Vec<NodeId> = remaining
                    .iter()
                    .copied()
                    .filter(|id| !visited.contains(id))
                    .collect();
                let on_cycle = unvisited.iter().find(|id| {
                    self.get(**id).map_or(false, |node| {
                        node.leaves().iter().any(|leaf| !visited.contains(leaf))
                    })
                });
                match on_cycle.or_else(|| unvisited.first()) {
                    Some(id) => {
                        trace!(node = %id, "breaking cycle with artificial root");
                        roots.push(*id);
                    }
                    None => continue,
                }
            }

            for root in roots {
                if visited.contains(&root) {
                    continue;
                }
                let visits = self.build_tree(root, &mut visited);
                forest.trees.push(build_layers(&visits));
            }
        }

        forest
    }

    /// Walks the leaves of `root` depth-first, in leaf order.
    ///
    /// Nodes already in `visited` are skipped, so a node reached twice
    /// (through a cycle or a second root) is expanded only once.
    fn build_tree(&self, root: NodeId, visited: &mut HashSet<NodeId>) -> Vec<Visit> {
        let mut visits = Vec::new();
        let mut stack = vec![Visit {
            node: root,
            depth: 0,
        }];

        while let Some(visit) = stack.pop() {
            if !visited.insert(visit.node) {
                continue;
            }
            visits.push(visit);

            if let Some(node) = self.get(visit.node) {
                // Reversed so the first leaf is expanded first.
                for leaf in node.leaves().iter().rev() {
                    if !visited.contains(leaf) {
                        stack.push(Visit {
                            node: *leaf,
                            depth: visit.depth + 1,
                        });
                    }
                }
            }
        }

        visits
    }

    /// Same as `resolve_links`, ordered to follow the forest: tree by tree,
    /// layer by layer.
    pub fn resolve_links_from_trees(&self, forest: &Forest) -> Vec<Link> {
        forest
            .tree_nodes()
            .filter_map(|id| self.get(id))
            .flat_map(|node| self.links_of(node))
            .collect()
    }

    /// Same as `resolve_links_from_trees`, with nodes given by their
    /// position in the flattened forest.
    pub fn resolve_index_links_from_trees(&self, forest: &Forest) -> Vec<IndexLink> {
        let positions: HashMap<NodeId, usize> = forest
            .tree_nodes()
            .enumerate()
            .map(|(position, id)| (id, position))
            .collect();

        self.resolve_links_from_trees(forest)
            .into_iter()
            .filter_map(|link| {
                Some(IndexLink::new(
                    *positions.get(&link.root)?,
                    link.root_slot,
                    *positions.get(&link.leaf)?,
                    link.leaf_slot,
                ))
            })
            .collect()
    }
}

/// Groups a depth-first walk into layers by depth.
fn build_layers(visits: &[Visit]) -> Tree {
    let mut layers: Vec<Vec<NodeId>> = Vec::new();
    for visit in visits {
        if layers.len() <= visit.depth {
            layers.resize_with(visit.depth + 1, Vec::new);
        }
        layers[visit.depth].push(visit.node);
    }
    Tree { layers }
}
