// datatree/src/common.rs

use serde::{Deserialize, Serialize};

use crate::error::{DataTreeError, Result};

/// 1-based node identifier. Item slot index is `node_id - 1`; id 1 is the implicit root.
pub type NodeId = u32;

/// Node id of the synthetic root item stored in slot 0.
pub const ROOT_NODE_ID: NodeId = 1;

/// Number of payload bits in a tagged word.
pub const PAYLOAD_BITS: u32 = 28;

/// Largest payload a tagged word can carry: node ids, pool ids and inline ints.
pub const MAX_PAYLOAD: u32 = (1 << PAYLOAD_BITS) - 1;

/// How a pool-referenced `Int` is resolved on decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IntRefMode {
    /// Return the 64-bit integer stored in the constant pool.
    #[default]
    Pooled,
    /// Return the raw pool index instead of the pooled integer.
    /// Only for consumers that depend on the historical decoder output.
    LegacyIndex,
}

/// Configuration for building and reading packed trees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeConfig {
    /// Highest node id a Tree Source may emit.
    pub max_node_id: u32,
    /// Highest id the constant pool may assign; ids start at 0.
    pub max_constant_id: u32,
    /// Decode policy for pool-referenced integers.
    #[serde(default)]
    pub int_refs: IntRefMode,
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            max_node_id: MAX_PAYLOAD,
            max_constant_id: MAX_PAYLOAD,
            int_refs: IntRefMode::Pooled,
        }
    }
}

impl TreeConfig {
    /// Limits may be lowered but never raised past the 28-bit payload.
    pub fn validate(&self) -> Result<()> {
        if self.max_node_id > MAX_PAYLOAD {
            return Err(DataTreeError::CapacityExceeded { what: "max_node_id", limit: MAX_PAYLOAD });
        }
        if self.max_constant_id > MAX_PAYLOAD {
            return Err(DataTreeError::CapacityExceeded { what: "max_constant_id", limit: MAX_PAYLOAD });
        }
        if self.max_node_id <= ROOT_NODE_ID {
            return Err(DataTreeError::InvalidNodeId(self.max_node_id));
        }
        Ok(())
    }
}
