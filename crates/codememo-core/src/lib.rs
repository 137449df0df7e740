//! Codememo Core - snippets and line ranges
//!
//! Leaf value types shared by the rest of Codememo: the [`Snippet`] a node
//! wraps, the [`LineRange`] used for absolute and relative line numbers,
//! the [`ReferenceInfo`] a leaf keeps for each of its roots, and the error
//! taxonomy every operation reports through.

pub mod error;
mod line;
mod snippet;

pub use error::{Error, LoadError, ReferenceError, RemovalError, Result};
pub use line::{LineRange, ReferenceInfo};
pub use snippet::Snippet;
