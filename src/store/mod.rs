// datatree/src/store/mod.rs

pub mod layout;
pub mod pool;

// Re-export key items for easier access from `crate::store::`
pub use layout::{Constant, Header, Item, TreeView};
pub use pool::ConstantPool;
