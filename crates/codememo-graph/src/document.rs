//! The persisted document format.
//!
//! ```json
//! {
//!   "nodes": [
//!     {
//!       "uuid": "<string>",
//!       "snippet": {"name": "", "content": "", "line_start": 1, "lang": "raw", "path": "", "url": ""},
//!       "comment": "",
//!       "roots": ["<uuid>"],
//!       "leaves": ["<uuid>"],
//!       "ref_infos": {"<root-uuid>": {"ref_start": 1, "ref_stop": null}}
//!     }
//!   ]
//! }
//! ```
//!
//! Reading a document always goes through [`CollectionBuilder`], so edges
//! are replayed and checked rather than trusted.

use crate::builder::CollectionBuilder;
use crate::collection::NodeCollection;
use crate::node::Node;
use codememo_core::LoadError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Document form of a whole collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub nodes: Vec<Node>,
}

impl NodeCollection {
    /// Returns the document form of this collection.
    pub fn to_document(&self) -> Document {
        Document {
            nodes: self.nodes().cloned().collect(),
        }
    }

    /// Rebuilds a collection from its document form.
    pub fn from_document(document: Document) -> Result<Self, LoadError> {
        let mut builder = CollectionBuilder::new();
        builder.add_nodes(document.nodes)?;
        builder.build()
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self.to_document())
    }

    pub fn from_value(value: Value) -> Result<Self, LoadError> {
        let document: Document = serde_json::from_value(value)?;
        Self::from_document(document)
    }

    /// Serializes to pretty-printed JSON.
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.to_document())
    }

    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        let document: Document = serde_json::from_str(json)?;
        Self::from_document(document)
    }
}
