//! Graph statistics.
//!
//! Cycle detection runs on a petgraph view of the collection; the view is
//! built on demand and thrown away afterwards.

use crate::collection::NodeCollection;
use crate::node::NodeId;
use codememo_core::ReferenceInfo;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Graph statistics for the status command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub tree_count: usize,
    pub orphan_count: usize,
    pub self_loops: usize,
    /// Strongly connected components with more than one node.
    pub cycles: usize,
}

impl NodeCollection {
    /// Builds a petgraph view: node weights are ids, edge weights the
    /// reference info the leaf keeps for the root.
    pub fn to_petgraph(&self) -> DiGraph<NodeId, ReferenceInfo> {
        let mut graph = DiGraph::with_capacity(self.len(), self.edge_count());
        let indexes: HashMap<NodeId, NodeIndex> =
            self.ids().map(|id| (id, graph.add_node(id))).collect();

        for link in self.resolve_links() {
            let info = self
                .get(link.leaf)
                .and_then(|leaf| leaf.ref_info(link.root))
                .copied()
                .unwrap_or_default();
            if let (Some(from), Some(to)) = (indexes.get(&link.root), indexes.get(&link.leaf)) {
                graph.add_edge(*from, *to, info);
            }
        }

        graph
    }

    /// Groups of nodes that reference each other in a cycle.
    ///
    /// Self-loops are not reported here.
    pub fn cycles(&self) -> Vec<Vec<NodeId>> {
        let graph = self.to_petgraph();
        tarjan_scc(&graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|component| component.into_iter().map(|idx| graph[idx]).collect())
            .collect()
    }

    /// Returns graph statistics.
    pub fn stats(&self) -> GraphStats {
        let forest = self.resolve_trees();
        GraphStats {
            node_count: self.len(),
            edge_count: self.edge_count(),
            tree_count: forest.trees.len(),
            orphan_count: forest.orphans.len(),
            self_loops: self.nodes().filter(|node| node.has_self_reference()).count(),
            cycles: self.cycles().len(),
        }
    }
}
