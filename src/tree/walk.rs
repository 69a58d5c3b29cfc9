// datatree/src/tree/walk.rs

use crate::common::{NodeId, ROOT_NODE_ID};
use crate::error::{DataTreeError, Result};
use crate::scalar::Value;
use crate::store::layout::TreeView;
use crate::tagged::ValueType;

use super::sink::{Subtree, TreeSink};

/// One `(key, value)` pair of a sibling chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entry<'a> {
    /// Id of the item holding this pair. Pass it to `children` when `value` is a table.
    pub node_id: NodeId,
    pub key: Value<'a>,
    pub value: Value<'a>,
}

/// Lazy walk over one node's sibling chain, in chain order.
///
/// Yields at most `item_count` entries; a longer chain can only come from a
/// cycle in a corrupt buffer and ends the walk with `InvalidFormat`.
#[derive(Debug, Clone)]
pub struct Children<'a> {
    view: TreeView<'a>,
    next: NodeId,
    budget: u32,
    failed: bool,
}

impl<'a> Children<'a> {
    fn step(&mut self) -> Result<Entry<'a>> {
        if self.budget == 0 {
            return Err(DataTreeError::InvalidFormat(format!(
                "sibling chain revisits node {}",
                self.next
            )));
        }
        self.budget -= 1;
        let node_id = self.next;
        let item = self.view.item_at(node_id - 1)?;
        if item.is_absent() {
            return Err(DataTreeError::InvalidFormat(format!("sibling chain reaches absent node {}", node_id)));
        }
        let key = self.view.resolve(item.key)?;
        let value = self.view.resolve(item.value)?;
        self.next = item.sibling;
        Ok(Entry { node_id, key, value })
    }
}

impl<'a> Iterator for Children<'a> {
    type Item = Result<Entry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next == 0 {
            return None;
        }
        let step = self.step();
        if step.is_err() {
            self.failed = true;
        }
        Some(step)
    }
}

/// Pre-order walk over every entry below a node, with its depth (0 for direct children).
#[derive(Debug)]
pub struct Descendants<'a> {
    view: TreeView<'a>,
    stack: Vec<Children<'a>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = Result<(usize, Entry<'a>)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let depth = self.stack.len().checked_sub(1)?;
            let entry = match self.stack[depth].next() {
                Some(Ok(entry)) => entry,
                Some(Err(e)) => {
                    self.stack.clear();
                    return Some(Err(e));
                }
                None => {
                    self.stack.pop();
                    continue;
                }
            };
            if entry.value.is_table() {
                match self.view.children(entry.node_id) {
                    Ok(children) => self.stack.push(children),
                    Err(e) => {
                        self.stack.clear();
                        return Some(Err(e));
                    }
                }
            }
            return Some(Ok((depth, entry)));
        }
    }
}

impl<'a> TreeView<'a> {
    /// Starts a walk over the children of `node_id`, whose value must be a table.
    pub fn children(&self, node_id: NodeId) -> Result<Children<'a>> {
        if node_id == 0 || node_id >= self.item_count() {
            return Err(DataTreeError::InvalidNodeId(node_id));
        }
        let item = self.item_at(node_id - 1)?;
        if item.is_absent() || item.value.decode()?.ty != ValueType::Table {
            return Err(DataTreeError::NotATable(node_id));
        }
        let head = match self.resolve(item.value)? {
            Value::Table(head) => head,
            _ => return Err(DataTreeError::NotATable(node_id)),
        };
        Ok(Children { view: *self, next: head, budget: self.item_count(), failed: false })
    }

    pub fn root(&self) -> Result<Children<'a>> {
        self.children(ROOT_NODE_ID)
    }

    pub fn descendants(&self, node_id: NodeId) -> Result<Descendants<'a>> {
        let first = self.children(node_id)?;
        Ok(Descendants { view: *self, stack: vec![first] })
    }

    /// Feeds the children of `node_id` to `sink`, offering nested tables as `Subtree`s.
    pub fn decode_into<S: TreeSink<'a>>(&self, node_id: NodeId, sink: &mut S) -> Result<()> {
        for entry in self.children(node_id)? {
            let entry = entry?;
            match entry.value {
                Value::Table(_) => sink.table(entry.key, Subtree::new(*self, entry.node_id))?,
                value => sink.scalar(entry.key, value)?,
            }
        }
        Ok(())
    }
}

/// Validates `bytes` and starts a walk over the children of `node_id`.
pub fn children_of(bytes: &[u8], node_id: NodeId) -> Result<Children<'_>> {
    TreeView::new(bytes)?.children(node_id)
}
