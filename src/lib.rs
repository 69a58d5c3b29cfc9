// datatree/src/lib.rs

//! Packed, read-only key/value trees.
//!
//! A tree is described as a flat list of [`Edge`]s linked by node id and
//! packed by [`Packer`] into one contiguous, pointer-free buffer. The buffer
//! can be stored or shipped as-is and walked in place through [`TreeView`].
//!
//! ```
//! use datatree::{pack, Edge, Value};
//!
//! let tree = pack(2, &[Edge::scalar(2, 3, "a", 1), Edge::scalar(3, 0, "b", "hello")])?;
//! let pairs: Vec<_> = tree.root()?.collect::<datatree::Result<_>>()?;
//! assert_eq!(pairs[1].value, Value::Str("hello"));
//! # Ok::<(), datatree::DataTreeError>(())
//! ```

pub mod common;
pub mod error;
pub mod json;
pub mod scalar;
pub mod store;
pub mod tagged;
pub mod tree;

pub use common::{IntRefMode, NodeId, TreeConfig, ROOT_NODE_ID};
pub use error::{DataTreeError, Result};
pub use scalar::{Scalar, Value};
pub use store::{ConstantPool, TreeView};
pub use tagged::{TaggedValue, ValueType};
pub use tree::{
    children_of, pack, Children, Descendants, Dump, Edge, EdgeValue, Entry, PackedTree, Packer, Subtree,
    TreeSink,
};
