// datatree/src/tree/packed.rs

use std::fmt;
use std::sync::Arc;

use crate::common::{IntRefMode, NodeId, ROOT_NODE_ID};
use crate::error::Result;
use crate::store::layout::TreeView;

use super::walk::Children;

/// A finished, immutable packed tree.
///
/// Cloning shares the underlying buffer. Every accessor re-validates the
/// header, so a `PackedTree` can be handed to any number of readers on any
/// thread without locking.
#[derive(Clone)]
pub struct PackedTree {
    bytes: Arc<[u8]>,
    int_refs: IntRefMode,
}

impl PackedTree {
    pub(crate) fn from_parts(bytes: Vec<u8>, int_refs: IntRefMode) -> Self {
        Self { bytes: bytes.into(), int_refs }
    }

    /// Adopts a buffer produced by `pack` in this process, e.g. one kept as raw bytes.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Result<Self> {
        let bytes = bytes.into();
        TreeView::new(&bytes)?;
        Ok(Self { bytes, int_refs: IntRefMode::default() })
    }

    pub fn with_int_refs(mut self, int_refs: IntRefMode) -> Self {
        self.int_refs = int_refs;
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn view(&self) -> Result<TreeView<'_>> {
        Ok(TreeView::new(&self.bytes)?.with_int_refs(self.int_refs))
    }

    pub fn children(&self, node_id: NodeId) -> Result<Children<'_>> {
        self.view()?.children(node_id)
    }

    pub fn root(&self) -> Result<Children<'_>> {
        self.children(ROOT_NODE_ID)
    }
}

impl fmt::Debug for PackedTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("PackedTree");
        s.field("len", &self.bytes.len());
        if let Ok(view) = TreeView::new(&self.bytes) {
            s.field("items", &view.item_count()).field("constants", &view.constant_count());
        }
        s.finish()
    }
}

impl AsRef<[u8]> for PackedTree {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
