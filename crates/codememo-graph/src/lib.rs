//! Codememo Graph - reference graph between code snippets
//!
//! This crate manages the graph of reference nodes. Each node wraps a code
//! snippet; an edge from a root to a leaf records which lines the leaf
//! refers to. The graph may contain self-loops, nodes with several roots,
//! and cycles.
//!
//! # Architecture
//!
//! Nodes live in an arena keyed by [`NodeId`]; edges are stored as ids on
//! both ends and only [`NodeCollection`] changes them. On top of that:
//! - Forest decomposition into layered trees for layout
//! - Link enumeration with slot indexes for connector drawing
//! - JSON documents, replayed and checked on load
//! - Graphviz DOT import/export
//!
//! # Example
//!
//! ```no_run
//! use codememo_core::Snippet;
//! use codememo_graph::{Node, NodeCollection};
//!
//! let mut collection = NodeCollection::new();
//! let main = collection.add_node(Node::new(Snippet::new("main.c", "int main(void) {\n  run();\n}")))?;
//! let run = collection.add_node(Node::new(Snippet::new("run.c", "void run(void) {}")))?;
//! collection.add_leaf(main, run)?;
//!
//! let forest = collection.resolve_trees();
//! let links = collection.resolve_links_from_trees(&forest);
//! collection.save("memo.json")?;
//! # Ok::<(), codememo_core::Error>(())
//! ```

mod analysis;
mod builder;
mod collection;
mod document;
mod dot;
mod forest;
mod link;
mod node;
mod store;

pub use analysis::GraphStats;
pub use builder::CollectionBuilder;
pub use collection::NodeCollection;
pub use document::Document;
pub use dot::{parse_dot, DotGraph};
pub use forest::{Forest, Tree};
pub use link::{IndexLink, Link};
pub use node::{Node, NodeId};
