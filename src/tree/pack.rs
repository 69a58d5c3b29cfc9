// datatree/src/tree/pack.rs

use std::io::{Cursor, Seek, SeekFrom, Write};

use log::{debug, trace, warn};

use crate::common::{NodeId, TreeConfig, MAX_PAYLOAD, ROOT_NODE_ID};
use crate::error::{DataTreeError, Result};
use crate::scalar::Scalar;
use crate::store::layout::{Header, Item, TreeView, ITEM_SIZE};
use crate::store::ConstantPool;
use crate::tagged::TaggedValue;

use super::packed::PackedTree;

/// The value side of an edge: a scalar, or the head id of a nested table.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeValue {
    Scalar(Scalar),
    /// Head node id of the child table's sibling chain (0 for an empty table).
    Subtree(NodeId),
}

/// One node of the input tree, as supplied by a Tree Source.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub node_id: NodeId,
    /// Next sibling in the parent's chain, 0 ends the chain.
    pub sibling_id: NodeId,
    pub key: Scalar,
    pub value: EdgeValue,
}

impl Edge {
    pub fn scalar(node_id: NodeId, sibling_id: NodeId, key: impl Into<Scalar>, value: impl Into<Scalar>) -> Self {
        Self { node_id, sibling_id, key: key.into(), value: EdgeValue::Scalar(value.into()) }
    }

    pub fn subtree(node_id: NodeId, sibling_id: NodeId, key: impl Into<Scalar>, head: NodeId) -> Self {
        Self { node_id, sibling_id, key: key.into(), value: EdgeValue::Subtree(head) }
    }
}

/// Builds exactly one packed tree. Consumed by `pack`, so a pool is never
/// reused across builds and a failed build cannot be retried in place.
#[derive(Debug)]
pub struct Packer {
    config: TreeConfig,
    pool: ConstantPool,
}

impl Packer {
    pub fn new(config: TreeConfig) -> Result<Self> {
        config.validate()?;
        let pool = ConstantPool::new(config.max_constant_id);
        Ok(Self { config, pool })
    }

    pub fn pack(mut self, first_child: NodeId, edges: &[Edge]) -> Result<PackedTree> {
        if first_child >= MAX_PAYLOAD || first_child > self.config.max_node_id {
            return Err(DataTreeError::CapacityExceeded { what: "first child id", limit: self.config.max_node_id.min(MAX_PAYLOAD - 1) });
        }
        if first_child == ROOT_NODE_ID {
            return Err(DataTreeError::InvalidNodeId(first_child));
        }

        // Sizing pass: validate ids and intern every scalar before allocating.
        let mut max_node_id = 0;
        for edge in edges {
            self.check_edge(edge)?;
            max_node_id = max_node_id.max(edge.node_id);
            self.pool.encode(&edge.key)?;
            if let EdgeValue::Scalar(value) = &edge.value {
                self.pool.encode(value)?;
            }
            trace!("sized edge {} (sibling {})", edge.node_id, edge.sibling_id);
        }

        // The root slot always exists, even with no edges.
        let item_count = max_node_id.max(ROOT_NODE_ID) + 1;
        let constant_count = self.pool.len() as u32;
        let header = Header::for_counts(item_count, constant_count, self.pool.string_bytes())
            .ok_or(DataTreeError::CapacityExceeded { what: "buffer size", limit: u32::MAX })?;

        // Zero-filled: an all-zero item marks an absent node.
        let mut buffer = vec![0u8; header.total_size];
        {
            let mut writer = Cursor::new(&mut buffer[..]);
            header.write_to(&mut writer)?;

            writer.seek(SeekFrom::Start(header.item_offset(0) as u64))?;
            Item { sibling: 0, key: TaggedValue::ABSENT, value: TaggedValue::table(first_child)? }
                .write_to(&mut writer)?;

            for edge in edges {
                let index = edge.node_id - 1;
                let offset = header.item_offset(index);
                if writer.get_ref()[offset..offset + ITEM_SIZE].iter().any(|&b| b != 0) {
                    warn!("node id {} emitted more than once, keeping the last edge", edge.node_id);
                }
                let value = match &edge.value {
                    EdgeValue::Scalar(value) => self.pool.encode(value)?,
                    EdgeValue::Subtree(head) => TaggedValue::table(*head)?,
                };
                let item = Item { sibling: edge.sibling_id, key: self.pool.encode(&edge.key)?, value };
                writer.seek(SeekFrom::Start(offset as u64))?;
                item.write_to(&mut writer)?;
            }

            writer.seek(SeekFrom::Start(header.constants_offset() as u64))?;
            for constant in self.pool.constants() {
                constant.write_to(&mut writer)?;
            }

            writer.seek(SeekFrom::Start(header.strings_offset() as u64))?;
            for s in self.pool.strings() {
                writer.write_all(s.as_bytes())?;
                writer.write_all(&[0])?;
            }
        }

        // The finished buffer must describe itself.
        TreeView::new(&buffer)?;
        debug!(
            "packed {} edges: {} items, {} constants, {} string bytes, {} bytes total",
            edges.len(),
            item_count,
            constant_count,
            self.pool.string_bytes(),
            header.total_size
        );
        Ok(PackedTree::from_parts(buffer, self.config.int_refs))
    }

    fn check_edge(&self, edge: &Edge) -> Result<()> {
        let max = self.config.max_node_id;
        if edge.node_id <= ROOT_NODE_ID {
            return Err(DataTreeError::InvalidNodeId(edge.node_id));
        }
        if edge.node_id > max {
            return Err(DataTreeError::CapacityExceeded { what: "node id", limit: max });
        }
        if edge.sibling_id == ROOT_NODE_ID {
            return Err(DataTreeError::InvalidNodeId(edge.sibling_id));
        }
        if edge.sibling_id > max {
            return Err(DataTreeError::CapacityExceeded { what: "sibling id", limit: max });
        }
        if let EdgeValue::Subtree(head) = edge.value {
            if head == ROOT_NODE_ID {
                return Err(DataTreeError::InvalidNodeId(head));
            }
            if head > max {
                return Err(DataTreeError::CapacityExceeded { what: "subtree head id", limit: max });
            }
        }
        Ok(())
    }
}

/// Packs `edges` with the default configuration.
pub fn pack(first_child: NodeId, edges: &[Edge]) -> Result<PackedTree> {
    Packer::new(TreeConfig::default())?.pack(first_child, edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::Value;

    #[test]
    fn flat_tree_packs_one_item_per_edge() {
        let tree = pack(2, &[Edge::scalar(2, 0, "a", 1)]).unwrap();
        let view = tree.view().unwrap();
        assert_eq!(view.item_count(), 3);
        assert_eq!(view.constant_count(), 1);
        let root = view.item_at(0).unwrap();
        assert_eq!(view.resolve(root.value).unwrap(), Value::Table(2));
        let item = view.item_at(1).unwrap();
        assert_eq!(item.sibling, 0);
        assert_eq!(view.resolve(item.key).unwrap(), Value::Str("a"));
        assert_eq!(view.resolve(item.value).unwrap(), Value::Int(1));
        assert!(view.item_at(2).unwrap().is_absent());
    }

    #[test]
    fn total_size_matches_buffer() {
        let tree = pack(2, &[Edge::scalar(2, 3, "k", "v"), Edge::scalar(3, 0, "k2", -7)]).unwrap();
        let header = tree.view().unwrap().header();
        assert_eq!(header.total_size, tree.as_bytes().len());
        assert_eq!(header.string_bytes(), "k\0v\0k2\0".len());
    }

    #[test]
    fn rejects_reserved_node_ids() {
        for node_id in [0, 1] {
            let err = pack(2, &[Edge::scalar(node_id, 0, "a", 1)]).unwrap_err();
            assert!(matches!(err, DataTreeError::InvalidNodeId(id) if id == node_id));
        }
        assert!(matches!(pack(1, &[]), Err(DataTreeError::InvalidNodeId(1))));
    }

    #[test]
    fn rejects_ids_beyond_payload() {
        let err = pack(2, &[Edge::scalar(MAX_PAYLOAD + 1, 0, "a", 1)]).unwrap_err();
        assert!(matches!(err, DataTreeError::CapacityExceeded { what: "node id", .. }));
        let err = pack(2, &[Edge::subtree(2, 0, "a", MAX_PAYLOAD + 1)]).unwrap_err();
        assert!(matches!(err, DataTreeError::CapacityExceeded { what: "subtree head id", .. }));
        let err = pack(MAX_PAYLOAD, &[]).unwrap_err();
        assert!(matches!(err, DataTreeError::CapacityExceeded { what: "first child id", .. }));
    }

    #[test]
    fn config_lowers_pool_capacity() {
        let config = TreeConfig { max_constant_id: 0, ..TreeConfig::default() };
        let edges = [Edge::scalar(2, 3, "a", 1), Edge::scalar(3, 0, "b", 1)];
        let err = Packer::new(config).unwrap().pack(2, &edges).unwrap_err();
        assert!(matches!(err, DataTreeError::CapacityExceeded { what: "constant pool id", limit: 0 }));
    }

    #[test]
    fn empty_edge_list_packs_empty_root() {
        let tree = pack(0, &[]).unwrap();
        let view = tree.view().unwrap();
        assert_eq!(view.item_count(), 2);
        assert_eq!(view.resolve(view.item_at(0).unwrap().value).unwrap(), Value::Table(0));
        assert!(view.item_at(1).unwrap().is_absent());
        assert_eq!(view.root().unwrap().count(), 0);
    }

    #[test]
    fn duplicate_node_id_keeps_last_edge() {
        let tree = pack(2, &[Edge::scalar(2, 0, "a", 1), Edge::scalar(2, 0, "b", 2)]).unwrap();
        let view = tree.view().unwrap();
        let item = view.item_at(1).unwrap();
        assert_eq!(view.resolve(item.key).unwrap(), Value::Str("b"));
        // both keys were interned during sizing
        assert_eq!(view.constant_count(), 2);
    }
}
