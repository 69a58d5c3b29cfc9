// datatree/src/tagged.rs

//! The 32-bit tagged word: `[1-bit reference flag][3-bit type][28-bit payload]`.
//!
//! All bit-mask logic lives here; the rest of the crate only sees `ValueType`,
//! `TaggedValue` and `Decoded`.

use std::fmt;

use crate::common::MAX_PAYLOAD;
use crate::error::{DataTreeError, Result};

const REF_FLAG: u32 = 0x8000_0000;
const TYPE_SHIFT: u32 = 28;
const TYPE_MASK: u32 = 7 << TYPE_SHIFT;

/// Type tag stored in bits 28..31. Zero is reserved for absent slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueType {
    Bool = 1,
    Int = 2,
    Real = 3,
    String = 4,
    Pointer = 5,
    Table = 6,
}

impl ValueType {
    fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            1 => Some(ValueType::Bool),
            2 => Some(ValueType::Int),
            3 => Some(ValueType::Real),
            4 => Some(ValueType::String),
            5 => Some(ValueType::Pointer),
            6 => Some(ValueType::Table),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Real => "real",
            ValueType::String => "string",
            ValueType::Pointer => "pointer",
            ValueType::Table => "table",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded tagged word. The payload is not yet resolved against the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub ty: ValueType,
    pub is_ref: bool,
    pub payload: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TaggedValue(u32);

impl TaggedValue {
    /// The all-zero word marking an absent item.
    pub const ABSENT: TaggedValue = TaggedValue(0);

    /// Encodes a value carried directly in the payload.
    /// Valid for `Bool` (0 or 1), non-negative `Int` and `Table` heads.
    pub fn inline(ty: ValueType, payload: u32) -> Result<Self> {
        match ty {
            ValueType::Bool if payload > 1 => {
                return Err(DataTreeError::TypeError(format!("bool payload must be 0 or 1, got {}", payload)));
            }
            ValueType::Bool | ValueType::Int | ValueType::Table => {}
            other => {
                return Err(DataTreeError::TypeError(format!("{} values are never inline", other)));
            }
        }
        if payload > MAX_PAYLOAD {
            return Err(DataTreeError::CapacityExceeded { what: "inline payload", limit: MAX_PAYLOAD });
        }
        Ok(TaggedValue((ty as u32) << TYPE_SHIFT | payload))
    }

    /// Encodes a reference into the constant pool.
    pub fn reference(ty: ValueType, pool_id: u32) -> Result<Self> {
        match ty {
            ValueType::Int | ValueType::Real | ValueType::String | ValueType::Pointer => {}
            other => {
                return Err(DataTreeError::TypeError(format!("{} values are never pool-referenced", other)));
            }
        }
        if pool_id > MAX_PAYLOAD {
            return Err(DataTreeError::CapacityExceeded { what: "constant pool id", limit: MAX_PAYLOAD });
        }
        Ok(TaggedValue(REF_FLAG | (ty as u32) << TYPE_SHIFT | pool_id))
    }

    pub fn table(head: u32) -> Result<Self> {
        Self::inline(ValueType::Table, head)
    }

    pub fn decode(self) -> Result<Decoded> {
        let ty = ValueType::from_bits((self.0 & TYPE_MASK) >> TYPE_SHIFT).ok_or_else(|| {
            DataTreeError::InvalidFormat(format!("invalid type tag in word {:#010x}", self.0))
        })?;
        Ok(Decoded {
            ty,
            is_ref: self.0 & REF_FLAG != 0,
            payload: self.0 & MAX_PAYLOAD,
        })
    }

    pub fn is_absent(self) -> bool {
        self.0 == 0
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn from_raw(raw: u32) -> Self {
        TaggedValue(raw)
    }
}

impl fmt::Debug for TaggedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decode() {
            Ok(d) => write!(f, "TaggedValue({}{} {})", if d.is_ref { "&" } else { "" }, d.ty, d.payload),
            Err(_) => write!(f, "TaggedValue({:#010x})", self.0),
        }
    }
}
