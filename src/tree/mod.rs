// datatree/src/tree/mod.rs

pub mod dump;
pub mod pack;
pub mod packed;
pub mod sink;
pub mod walk;

pub use dump::Dump;
pub use pack::{pack, Edge, EdgeValue, Packer};
pub use packed::PackedTree;
pub use sink::{Subtree, TreeSink};
pub use walk::{children_of, Children, Descendants, Entry};
