// datatree/src/store/layout.rs

//! Offset arithmetic over the packed buffer.
//!
//! ```text
//! header:        total_size (machine word), item_count (u32), constant_count (u32)
//! constant pool: constant_count x SLOT_SIZE
//! items:         item_count x { sibling: u32, key: u32, value: u32 }
//! strings:       raw bytes, NUL-terminated per unique string
//! ```
//!
//! All fields use native width and endianness. A packed buffer is only
//! meaningful inside the process (or architecture) that built it.

use std::io::{Cursor, Read, Write};
use std::mem::size_of;

use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};

use crate::common::{IntRefMode, NodeId};
use crate::error::{DataTreeError, Result};
use crate::scalar::Value;
use crate::tagged::{TaggedValue, ValueType};

// --- Constants ---
pub const WORD_SIZE: usize = size_of::<usize>();
pub const HEADER_SIZE: usize = WORD_SIZE + 4 + 4;
pub const SLOT_SIZE: usize = max(max(size_of::<i64>(), size_of::<f64>()), size_of::<usize>());
pub const ITEM_SIZE: usize = 4 + 4 + 4;

const fn max(a: usize, b: usize) -> usize {
    if a > b { a } else { b }
}

// --- Structures ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub total_size: usize,
    pub item_count: u32,
    pub constant_count: u32,
}

impl Header {
    /// Computes the header for a buffer with the given region sizes.
    /// Returns `None` if the total does not fit in `usize`.
    pub fn for_counts(item_count: u32, constant_count: u32, string_bytes: usize) -> Option<Self> {
        let total_size = (constant_count as usize)
            .checked_mul(SLOT_SIZE)?
            .checked_add((item_count as usize).checked_mul(ITEM_SIZE)?)?
            .checked_add(HEADER_SIZE)?
            .checked_add(string_bytes)?;
        Some(Self { total_size, item_count, constant_count })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_uint::<NativeEndian>(self.total_size as u64, WORD_SIZE)?;
        writer.write_u32::<NativeEndian>(self.item_count)?;
        writer.write_u32::<NativeEndian>(self.constant_count)?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let total_size = reader.read_uint::<NativeEndian>(WORD_SIZE)? as usize;
        let item_count = reader.read_u32::<NativeEndian>()?;
        let constant_count = reader.read_u32::<NativeEndian>()?;
        Ok(Self { total_size, item_count, constant_count })
    }

    pub fn size() -> usize {
        HEADER_SIZE
    }

    pub fn constants_offset(&self) -> usize {
        HEADER_SIZE
    }

    pub fn items_offset(&self) -> usize {
        HEADER_SIZE + self.constant_count as usize * SLOT_SIZE
    }

    pub fn strings_offset(&self) -> usize {
        self.items_offset() + self.item_count as usize * ITEM_SIZE
    }

    pub fn item_offset(&self, index: u32) -> usize {
        self.items_offset() + index as usize * ITEM_SIZE
    }

    pub fn string_bytes(&self) -> usize {
        self.total_size.saturating_sub(self.strings_offset())
    }
}

/// One node slot. An all-zero item marks an absent node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Item {
    pub sibling: NodeId,
    pub key: TaggedValue,
    pub value: TaggedValue,
}

impl Item {
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u32::<NativeEndian>(self.sibling)?;
        writer.write_u32::<NativeEndian>(self.key.raw())?;
        writer.write_u32::<NativeEndian>(self.value.raw())?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let sibling = reader.read_u32::<NativeEndian>()?;
        let key = TaggedValue::from_raw(reader.read_u32::<NativeEndian>()?);
        let value = TaggedValue::from_raw(reader.read_u32::<NativeEndian>()?);
        Ok(Self { sibling, key, value })
    }

    pub fn is_absent(&self) -> bool {
        self.value.is_absent()
    }
}

/// A constant pool slot as written by the encoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constant {
    Int(i64),
    Real(f64),
    Pointer(usize),
    /// Byte offset into the string region.
    StringOffset(u64),
}

impl Constant {
    /// Writes exactly `SLOT_SIZE` bytes.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        match *self {
            Constant::Int(n) => writer.write_i64::<NativeEndian>(n)?,
            Constant::Real(f) => writer.write_f64::<NativeEndian>(f)?,
            Constant::Pointer(p) => writer.write_uint::<NativeEndian>(p as u64, WORD_SIZE)?,
            Constant::StringOffset(off) => writer.write_u64::<NativeEndian>(off)?,
        }
        let written = match self {
            Constant::Pointer(_) => WORD_SIZE,
            _ => 8,
        };
        if written < SLOT_SIZE {
            writer.write_all(&[0u8; SLOT_SIZE][..SLOT_SIZE - written])?;
        }
        Ok(())
    }
}

/// Read-only, bounds-checked accessors over a validated packed buffer.
#[derive(Debug, Clone, Copy)]
pub struct TreeView<'a> {
    bytes: &'a [u8],
    header: Header,
    int_refs: IntRefMode,
}

impl<'a> TreeView<'a> {
    /// Validates the header against the actual buffer length.
    pub fn new(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(DataTreeError::InvalidFormat(format!(
                "buffer of {} bytes is smaller than the {} byte header",
                bytes.len(),
                HEADER_SIZE
            )));
        }
        let header = Header::read_from(&mut Cursor::new(bytes))
            .map_err(|e| DataTreeError::InvalidFormat(format!("Failed to read header: {}", e)))?;
        if header.total_size != bytes.len() {
            return Err(DataTreeError::InvalidFormat(format!(
                "declared size {} does not match buffer length {}",
                header.total_size,
                bytes.len()
            )));
        }
        let regions = Header::for_counts(header.item_count, header.constant_count, 0)
            .ok_or_else(|| DataTreeError::InvalidFormat("region sizes overflow".into()))?;
        if regions.total_size > bytes.len() {
            return Err(DataTreeError::InvalidFormat(format!(
                "{} items and {} constants do not fit in {} bytes",
                header.item_count,
                header.constant_count,
                bytes.len()
            )));
        }
        Ok(Self { bytes, header, int_refs: IntRefMode::default() })
    }

    pub fn with_int_refs(mut self, int_refs: IntRefMode) -> Self {
        self.int_refs = int_refs;
        self
    }

    pub fn header(&self) -> Header {
        self.header
    }

    pub fn item_count(&self) -> u32 {
        self.header.item_count
    }

    pub fn constant_count(&self) -> u32 {
        self.header.constant_count
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Raw `SLOT_SIZE` bytes of constant `id`.
    pub fn constant_at(&self, id: u32) -> Result<&'a [u8]> {
        if id >= self.header.constant_count {
            return Err(DataTreeError::InvalidFormat(format!(
                "constant {} out of range ({} constants)",
                id, self.header.constant_count
            )));
        }
        let start = self.header.constants_offset() + id as usize * SLOT_SIZE;
        Ok(&self.bytes[start..start + SLOT_SIZE])
    }

    pub fn item_at(&self, index: u32) -> Result<Item> {
        if index >= self.header.item_count {
            return Err(DataTreeError::InvalidFormat(format!(
                "item {} out of range ({} items)",
                index, self.header.item_count
            )));
        }
        let start = self.header.item_offset(index);
        Item::read_from(&mut &self.bytes[start..start + ITEM_SIZE])
            .map_err(|e| DataTreeError::InvalidFormat(format!("Failed to read item {}: {}", index, e)))
    }

    /// The NUL-terminated string starting at `offset` in the string region.
    pub fn string_at(&self, offset: u64) -> Result<&'a str> {
        let region = &self.bytes[self.header.strings_offset()..];
        let start = usize::try_from(offset).ok().filter(|&o| o < region.len()).ok_or_else(|| {
            DataTreeError::InvalidFormat(format!(
                "string offset {} out of range ({} string bytes)",
                offset,
                region.len()
            ))
        })?;
        let tail = &region[start..];
        let len = tail.iter().position(|&b| b == 0).ok_or_else(|| {
            DataTreeError::InvalidFormat(format!("string at offset {} is not terminated", offset))
        })?;
        std::str::from_utf8(&tail[..len])
            .map_err(|e| DataTreeError::InvalidFormat(format!("string at offset {}: {}", offset, e)))
    }

    fn constant_i64(&self, id: u32) -> Result<i64> {
        let mut slot = self.constant_at(id)?;
        Ok(slot.read_i64::<NativeEndian>()?)
    }

    fn constant_f64(&self, id: u32) -> Result<f64> {
        let mut slot = self.constant_at(id)?;
        Ok(slot.read_f64::<NativeEndian>()?)
    }

    fn constant_u64(&self, id: u32) -> Result<u64> {
        let mut slot = self.constant_at(id)?;
        Ok(slot.read_u64::<NativeEndian>()?)
    }

    fn constant_pointer(&self, id: u32) -> Result<usize> {
        let mut slot = self.constant_at(id)?;
        Ok(slot.read_uint::<NativeEndian>(WORD_SIZE)? as usize)
    }

    /// Resolves a tagged word to a concrete value, fetching pool entries as needed.
    pub fn resolve(&self, word: TaggedValue) -> Result<Value<'a>> {
        let decoded = word.decode()?;
        let payload = decoded.payload;
        let value = match decoded.ty {
            ValueType::Bool => Value::Bool(payload != 0),
            // Table payload is always the inline child-head id.
            ValueType::Table => Value::Table(payload),
            ValueType::Int if !decoded.is_ref => Value::Int(payload as i64),
            ValueType::Int => match self.int_refs {
                IntRefMode::Pooled => Value::Int(self.constant_i64(payload)?),
                IntRefMode::LegacyIndex => {
                    // Still bounds-checked, only the returned number differs.
                    self.constant_at(payload)?;
                    Value::Int(payload as i64)
                }
            },
            ty if !decoded.is_ref => {
                return Err(DataTreeError::InvalidFormat(format!("{} value must be pool-referenced", ty)));
            }
            ValueType::Real => Value::Real(self.constant_f64(payload)?),
            ValueType::String => Value::Str(self.string_at(self.constant_u64(payload)?)?),
            ValueType::Pointer => Value::Pointer(self.constant_pointer(payload)?),
        };
        Ok(value)
    }
}
