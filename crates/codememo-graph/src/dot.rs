//! Graphviz DOT import and export.
//!
//! Import goes through the `graphviz-rust` parser and keeps only the graph
//! structure: node names and edges. Attributes, ports and graph settings
//! are dropped. Subgraphs are flattened; an edge to or from a subgraph
//! connects every node inside it, as in DOT itself.

use crate::collection::NodeCollection;
use crate::node::{Node, NodeId};
use codememo_core::{LoadError, ReferenceError, Snippet};
use graphviz_rust::dot_structures::{Edge, EdgeTy, Graph, Id, NodeId as DotNodeId, Stmt, Vertex};
use indexmap::{IndexMap, IndexSet};
use petgraph::dot::Dot;
use petgraph::graph::DiGraph;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Nodes and edges read from a DOT file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DotGraph {
    /// Node names in order of first appearance.
    pub nodes: Vec<String>,
    pub edges: Vec<(String, String)>,
}

#[derive(Default)]
struct Collector {
    nodes: IndexSet<String>,
    edges: Vec<(String, String)>,
}

impl Collector {
    fn node(&mut self, id: &DotNodeId) -> String {
        let name = node_name(&id.0);
        self.nodes.insert(name.clone());
        name
    }

    /// Walks statements, returning every node they mention.
    fn statements(&mut self, stmts: &[Stmt]) -> Vec<String> {
        let mut mentioned = Vec::new();
        for stmt in stmts {
            match stmt {
                Stmt::Node(node) => mentioned.push(self.node(&node.id)),
                Stmt::Edge(edge) => mentioned.extend(self.edge(edge)),
                Stmt::Subgraph(subgraph) => mentioned.extend(self.statements(&subgraph.stmts)),
                _ => {}
            }
        }
        mentioned
    }

    fn vertex(&mut self, vertex: &Vertex) -> Vec<String> {
        match vertex {
            Vertex::N(id) => vec![self.node(id)],
            Vertex::S(subgraph) => self.statements(&subgraph.stmts),
        }
    }

    fn edge(&mut self, edge: &Edge) -> Vec<String> {
        let groups: Vec<Vec<String>> = match &edge.ty {
            EdgeTy::Pair(from, to) => vec![self.vertex(from), self.vertex(to)],
            EdgeTy::Chain(vertices) => vertices.iter().map(|v| self.vertex(v)).collect(),
        };
        for pair in groups.windows(2) {
            for from in &pair[0] {
                for to in &pair[1] {
                    self.edges.push((from.clone(), to.clone()));
                }
            }
        }
        groups.into_iter().flatten().collect()
    }
}

/// The name a DOT id stands for, without quoting.
fn node_name(id: &Id) -> String {
    match id {
        Id::Escaped(quoted) => quoted
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(quoted.as_str())
            .replace("\\\"", "\""),
        Id::Html(name) | Id::Plain(name) | Id::Anonymous(name) => name.clone(),
    }
}

/// Parses DOT source into its nodes and edges.
pub fn parse_dot(source: &str) -> Result<DotGraph, LoadError> {
    let graph = graphviz_rust::parse(source).map_err(LoadError::Dot)?;
    let stmts = match graph {
        Graph::Graph { stmts, .. } | Graph::DiGraph { stmts, .. } => stmts,
    };

    let mut collector = Collector::default();
    collector.statements(&stmts);
    Ok(DotGraph {
        nodes: collector.nodes.into_iter().collect(),
        edges: collector.edges,
    })
}

impl NodeCollection {
    /// Builds a collection from DOT source.
    ///
    /// Every DOT node becomes a node with an empty snippet named after it;
    /// every edge `a -> b` makes `b` a leaf of `a`. Repeated edges are
    /// skipped.
    pub fn from_dot(source: &str) -> Result<Self, LoadError> {
        let dot = parse_dot(source)?;
        let mut collection = NodeCollection::new();
        let mut ids: IndexMap<&str, NodeId> = IndexMap::new();

        for name in &dot.nodes {
            let id = collection.add_node(Node::new(Snippet::new(name.as_str(), "")))?;
            ids.insert(name.as_str(), id);
        }

        for (from, to) in &dot.edges {
            let (Some(root), Some(leaf)) = (ids.get(from.as_str()), ids.get(to.as_str())) else {
                continue;
            };
            match collection.add_leaf(*root, *leaf) {
                Ok(()) => {}
                Err(ReferenceError::Duplicate { .. }) => {
                    warn!(from = %from, to = %to, "skipping repeated edge");
                }
                Err(e) => return Err(e.into()),
            }
        }

        debug!(
            nodes = collection.len(),
            edges = collection.edge_count(),
            "imported DOT graph"
        );
        Ok(collection)
    }

    /// Renders the collection as a Graphviz digraph.
    ///
    /// Nodes are labelled with their snippet name, edges with the lines
    /// the leaf refers to.
    pub fn to_dot(&self) -> String {
        let mut graph: DiGraph<String, String> = DiGraph::new();
        let indexes: HashMap<NodeId, _> = self
            .nodes()
            .map(|node| (node.id(), graph.add_node(node.snippet.name.clone())))
            .collect();

        for link in self.resolve_links() {
            let label = self
                .get(link.leaf)
                .and_then(|leaf| leaf.ref_info(link.root))
                .map(|info| info.range().to_string())
                .unwrap_or_default();
            if let (Some(from), Some(to)) = (indexes.get(&link.root), indexes.get(&link.leaf)) {
                graph.add_edge(*from, *to, label);
            }
        }

        format!("{}", Dot::new(&graph))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_edges_and_nodes() {
        let source = r#"
            // call graph
            digraph calls {
                rankdir = LR;
                node [shape=box, style="rounded"];
                main -> "parse args" -> helper [label="x"];
                main -> helper;
                lonely; // no edges
                /* trailing */
            }
        "#;
        let dot = parse_dot(source).unwrap();
        assert_eq!(dot.nodes, vec!["main", "parse args", "helper", "lonely"]);
        assert_eq!(
            dot.edges,
            vec![
                ("main".to_string(), "parse args".to_string()),
                ("parse args".to_string(), "helper".to_string()),
                ("main".to_string(), "helper".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_ignores_ports() {
        let dot = parse_dot("digraph { a:out -> b:in:n; b:s -> c }").unwrap();
        assert_eq!(dot.nodes, vec!["a", "b", "c"]);
        assert_eq!(
            dot.edges,
            vec![
                ("a".to_string(), "b".to_string()),
                ("b".to_string(), "c".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_html_labels() {
        let dot = parse_dot("digraph { a [label=<<b>x</b>>]; a -> b; }").unwrap();
        assert_eq!(dot.nodes, vec!["a", "b"]);
        assert_eq!(dot.edges, vec![("a".to_string(), "b".to_string())]);
    }

    #[test]
    fn test_parse_flattens_subgraphs() {
        let source = r#"
            digraph {
                subgraph cluster_0 { x -> y }
                root -> { x z }
            }
        "#;
        let dot = parse_dot(source).unwrap();
        assert_eq!(dot.nodes, vec!["x", "y", "root", "z"]);
        assert_eq!(
            dot.edges,
            vec![
                ("x".to_string(), "y".to_string()),
                ("root".to_string(), "x".to_string()),
                ("root".to_string(), "z".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_rejects_unterminated_graph() {
        assert!(matches!(parse_dot("digraph { a -> b"), Err(LoadError::Dot(_))));
    }

    #[test]
    fn test_from_dot_builds_collection() {
        let collection = NodeCollection::from_dot("digraph { a -> b; a -> c; c -> a; a -> b; d }").unwrap();

        assert_eq!(collection.len(), 4);
        assert_eq!(collection.edge_count(), 3);
        let a = collection.find_by_name("a")[0];
        let b = collection.find_by_name("b")[0];
        assert_eq!(a.leaves().len(), 2);
        assert_eq!(b.roots(), &[a.id()]);
        assert_eq!(b.ref_info(a.id()).map(|info| info.ref_start), Some(1));
        collection.verify().unwrap();
    }

    #[test]
    fn test_to_dot_labels() {
        let mut collection = NodeCollection::new();
        let a = collection.add_node(Node::new(Snippet::new("main.rs", "fn main() {}"))).unwrap();
        let b = collection
            .add_node(Node::new(Snippet::new("lib.rs", "pub fn run() {\n}")))
            .unwrap();
        collection.add_leaf_reference(a, b, 1, Some(2)).unwrap();

        let dot = collection.to_dot();
        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains("main.rs"));
        assert!(dot.contains("lib.rs"));
        assert!(dot.contains("L1-2"));
        assert!(dot.contains("0 -> 1"));
    }

    #[test]
    fn test_dot_export_reimports() {
        let original = NodeCollection::from_dot("digraph { x -> y; y -> z }").unwrap();
        let reimported = NodeCollection::from_dot(&original.to_dot()).unwrap();
        // Exported ids are petgraph indexes, so names become "0", "1", "2".
        assert_eq!(reimported.len(), 3);
        assert_eq!(reimported.edge_count(), 2);
    }
}
