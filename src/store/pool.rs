// datatree/src/store/pool.rs

use std::collections::HashMap;

use log::trace;

use crate::common::MAX_PAYLOAD;
use crate::error::{DataTreeError, Result};
use crate::scalar::Scalar;
use crate::store::layout::Constant;
use crate::tagged::{TaggedValue, ValueType};

/// Content key for numbers and pointers. Floats compare by bit pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum NumberKey {
    Int(i64),
    Real(u64),
    Pointer(usize),
}

#[derive(Debug)]
enum PoolEntry {
    Number(NumberKey),
    Str(Box<str>),
}

/// Deduplicating constant pool for one build.
///
/// Ids are dense and assigned in first-encounter order starting at 0. The pool
/// also tracks how many bytes the string region needs (`len + 1` per unique
/// string) so the buffer can be sized before it is allocated.
#[derive(Debug)]
pub struct ConstantPool {
    numbers: HashMap<NumberKey, u32>,
    strings: HashMap<Box<str>, u32>,
    entries: Vec<PoolEntry>,
    string_bytes: usize,
    max_id: u32,
}

impl ConstantPool {
    pub fn new(max_id: u32) -> Self {
        Self {
            numbers: HashMap::new(),
            strings: HashMap::new(),
            entries: Vec::new(),
            string_bytes: 0,
            max_id: max_id.min(MAX_PAYLOAD),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bytes needed by the string region, terminators included.
    pub fn string_bytes(&self) -> usize {
        self.string_bytes
    }

    /// Encodes a scalar as a tagged word, interning it when it cannot be inline.
    pub fn encode(&mut self, scalar: &Scalar) -> Result<TaggedValue> {
        match scalar {
            Scalar::Bool(b) => TaggedValue::inline(ValueType::Bool, *b as u32),
            Scalar::Int(n) if (0..=MAX_PAYLOAD as i64).contains(n) => {
                TaggedValue::inline(ValueType::Int, *n as u32)
            }
            other => {
                let id = self.intern(other)?;
                TaggedValue::reference(other.value_type(), id)
            }
        }
    }

    /// Returns the pool id for `scalar`, assigning the next id on first sight.
    pub fn intern(&mut self, scalar: &Scalar) -> Result<u32> {
        let number = match scalar {
            Scalar::Bool(_) => {
                return Err(DataTreeError::TypeError("bool values are never pooled".into()));
            }
            Scalar::Int(n) => NumberKey::Int(*n),
            Scalar::Real(f) => NumberKey::Real(f.to_bits()),
            Scalar::Pointer(p) => NumberKey::Pointer(*p),
            Scalar::Str(s) => return self.intern_str(s),
        };
        if let Some(&id) = self.numbers.get(&number) {
            return Ok(id);
        }
        let id = self.next_id()?;
        self.numbers.insert(number, id);
        self.entries.push(PoolEntry::Number(number));
        trace!("pool: {:?} -> {}", number, id);
        Ok(id)
    }

    fn intern_str(&mut self, s: &str) -> Result<u32> {
        if let Some(&id) = self.strings.get(s) {
            return Ok(id);
        }
        if s.as_bytes().contains(&0) {
            return Err(DataTreeError::TypeError(format!("string {:?} contains a NUL byte", s)));
        }
        let id = self.next_id()?;
        let owned: Box<str> = s.into();
        self.strings.insert(owned.clone(), id);
        self.entries.push(PoolEntry::Str(owned));
        self.string_bytes += s.len() + 1;
        trace!("pool: string {:?} -> {}", s, id);
        Ok(id)
    }

    fn next_id(&self) -> Result<u32> {
        let id = self.entries.len();
        if id > self.max_id as usize {
            return Err(DataTreeError::CapacityExceeded { what: "constant pool id", limit: self.max_id });
        }
        Ok(id as u32)
    }

    /// Pool slots in id order. String entries carry their offset into the string region.
    pub fn constants(&self) -> impl Iterator<Item = Constant> + '_ {
        let mut offset = 0u64;
        self.entries.iter().map(move |entry| match entry {
            PoolEntry::Number(NumberKey::Int(n)) => Constant::Int(*n),
            PoolEntry::Number(NumberKey::Real(bits)) => Constant::Real(f64::from_bits(*bits)),
            PoolEntry::Number(NumberKey::Pointer(p)) => Constant::Pointer(*p),
            PoolEntry::Str(s) => {
                let at = offset;
                offset += s.len() as u64 + 1;
                Constant::StringOffset(at)
            }
        })
    }

    /// Unique strings in id order, as laid out in the string region.
    pub fn strings(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().filter_map(|entry| match entry {
            PoolEntry::Str(s) => Some(&**s),
            PoolEntry::Number(_) => None,
        })
    }
}
