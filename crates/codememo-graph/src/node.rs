//! Reference nodes.
//!
//! A node wraps one snippet and records its edges by id. Edges are only
//! ever changed through `NodeCollection`, which keeps both ends in step.

use codememo_core::{LoadError, ReferenceInfo, Snippet};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identity of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Generates a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The first eight hex digits, enough to tell nodes apart on screen.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for NodeId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl std::str::FromStr for NodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// A vertex of the reference graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "uuid")]
    id: NodeId,

    /// The wrapped code excerpt.
    pub snippet: Snippet,

    /// Free-form note attached to the snippet.
    #[serde(default)]
    pub comment: String,

    /// Nodes this node refers to.
    #[serde(default)]
    pub(crate) roots: Vec<NodeId>,

    /// Nodes that refer to this node.
    #[serde(default)]
    pub(crate) leaves: Vec<NodeId>,

    /// Referenced lines, keyed by root. Kept in the same order as `roots`.
    #[serde(default)]
    pub(crate) ref_infos: IndexMap<NodeId, ReferenceInfo>,
}

impl Node {
    /// Creates a detached node with a fresh id.
    pub fn new(snippet: Snippet) -> Self {
        Self::with_id(NodeId::new(), snippet)
    }

    /// Creates a detached node with a caller-chosen id.
    pub fn with_id(id: NodeId, snippet: Snippet) -> Self {
        Self {
            id,
            snippet,
            comment: String::new(),
            roots: Vec::new(),
            leaves: Vec::new(),
            ref_infos: IndexMap::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn leaves(&self) -> &[NodeId] {
        &self.leaves
    }

    /// The lines of `root`'s snippet this node refers to.
    pub fn ref_info(&self, root: NodeId) -> Option<&ReferenceInfo> {
        self.ref_infos.get(&root)
    }

    pub fn ref_infos(&self) -> impl Iterator<Item = (NodeId, &ReferenceInfo)> {
        self.ref_infos.iter().map(|(id, info)| (*id, info))
    }

    /// True when the node has neither roots nor leaves.
    pub fn is_detached(&self) -> bool {
        self.roots.is_empty() && self.leaves.is_empty() && self.ref_infos.is_empty()
    }

    pub fn has_self_reference(&self) -> bool {
        self.leaves.contains(&self.id)
    }

    /// Position of `root` within this node's roots.
    pub fn root_slot(&self, root: NodeId) -> Option<usize> {
        self.roots.iter().position(|id| *id == root)
    }

    /// Position of `leaf` within this node's leaves.
    pub fn leaf_slot(&self, leaf: NodeId) -> Option<usize> {
        self.leaves.iter().position(|id| *id == leaf)
    }

    pub(crate) fn attach_root(&mut self, root: NodeId, info: ReferenceInfo) {
        self.roots.push(root);
        self.ref_infos.insert(root, info);
    }

    pub(crate) fn attach_leaf(&mut self, leaf: NodeId) {
        self.leaves.push(leaf);
    }

    pub(crate) fn detach_root(&mut self, root: NodeId) {
        self.roots.retain(|id| *id != root);
        self.ref_infos.shift_remove(&root);
    }

    pub(crate) fn detach_leaf(&mut self, leaf: NodeId) {
        self.leaves.retain(|id| *id != leaf);
    }

    /// Drops all edge bookkeeping, returning what was recorded.
    pub(crate) fn take_edges(&mut self) -> RecordedEdges {
        RecordedEdges {
            roots: std::mem::take(&mut self.roots),
            leaves: std::mem::take(&mut self.leaves),
            ref_infos: std::mem::take(&mut self.ref_infos),
        }
    }

    /// Puts roots back in `order`, which must hold the same ids.
    pub(crate) fn reorder_roots(&mut self, order: &[NodeId]) {
        self.roots = order.to_vec();
        let mut ordered = IndexMap::with_capacity(order.len());
        for root in order {
            if let Some(info) = self.ref_infos.shift_remove(root) {
                ordered.insert(*root, info);
            }
        }
        self.ref_infos = ordered;
    }

    /// Serializes this node to its document form.
    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// Reads a node from its document form.
    pub fn from_value(value: serde_json::Value) -> Result<Self, LoadError> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Edge lists recorded on a node, detached from it.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordedEdges {
    pub roots: Vec<NodeId>,
    pub leaves: Vec<NodeId>,
    pub ref_infos: IndexMap<NodeId, ReferenceInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node_data() -> serde_json::Value {
        json!({
            "uuid": "554baf0e-b43a-4a52-a384-161e1f196320",
            "snippet": {
                "name": "foo.py",
                "content": "def foo():\n    print(\"foo\")",
                "line_start": 5,
                "lang": "python",
                "path": "~/data/foo.py",
                "url": "https://foo.bar/snippet/foo.py",
            },
            "comment": "just some comment...",
            "roots": [],
            "leaves": [],
            "ref_infos": {},
        })
    }

    #[test]
    fn test_to_dict() {
        let data = node_data();
        let snippet: Snippet = serde_json::from_value(data["snippet"].clone()).unwrap();
        let id: NodeId = "554baf0e-b43a-4a52-a384-161e1f196320".parse().unwrap();
        let node = Node::with_id(id, snippet).with_comment("just some comment...");
        assert_eq!(node.to_value().unwrap(), data);
    }

    #[test]
    fn test_from_dict() {
        let data = node_data();
        let node = Node::from_value(data.clone()).unwrap();
        assert!(node.is_detached());
        assert_eq!(node.to_value().unwrap(), data);
    }

    #[test]
    fn test_from_dict_rejects_bad_uuid() {
        let mut data = node_data();
        data["uuid"] = json!("not-a-uuid");
        assert!(matches!(Node::from_value(data), Err(LoadError::Json(_))));
    }

    #[test]
    fn test_from_dict_requires_snippet() {
        let mut data = node_data();
        data.as_object_mut().unwrap().remove("snippet");
        assert!(Node::from_value(data).is_err());
    }

    #[test]
    fn test_reorder_roots_keeps_ref_infos_aligned() {
        let mut node = Node::new(Snippet::new("a", "x"));
        let (r1, r2) = (NodeId::new(), NodeId::new());
        node.attach_root(r1, ReferenceInfo::new(1, None));
        node.attach_root(r2, ReferenceInfo::new(1, Some(1)));

        node.reorder_roots(&[r2, r1]);

        assert_eq!(node.roots(), &[r2, r1]);
        let keys: Vec<NodeId> = node.ref_infos().map(|(id, _)| id).collect();
        assert_eq!(keys, vec![r2, r1]);
    }

    #[test]
    fn test_short_id() {
        let id: NodeId = "554baf0e-b43a-4a52-a384-161e1f196320".parse().unwrap();
        assert_eq!(id.short(), "554baf0e");
        assert_eq!(id.to_string(), "554baf0e-b43a-4a52-a384-161e1f196320");
    }
}
