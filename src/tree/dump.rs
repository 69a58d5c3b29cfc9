// datatree/src/tree/dump.rs

use std::fmt;

use crate::store::layout::TreeView;
use crate::tagged::TaggedValue;

/// Human-readable listing of every present item, for debugging.
///
/// ```text
/// ROOT[2]
/// [2] -> 3 name : tree
/// [3] -> 0 size : [4]
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Dump<'a> {
    view: TreeView<'a>,
}

impl<'a> TreeView<'a> {
    pub fn dump(&self) -> Dump<'a> {
        Dump { view: *self }
    }
}

impl Dump<'_> {
    fn write_value(&self, f: &mut fmt::Formatter<'_>, word: TaggedValue) -> fmt::Result {
        match self.view.resolve(word) {
            Ok(value) => write!(f, "{}", value),
            Err(_) => f.write_str("[Invalid]"),
        }
    }
}

impl fmt::Display for Dump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ROOT")?;
        match self.view.item_at(0) {
            Ok(root) => self.write_value(f, root.value)?,
            Err(_) => f.write_str("[Invalid]")?,
        }
        writeln!(f)?;
        for index in 1..self.view.item_count() {
            let Ok(item) = self.view.item_at(index) else { break };
            if item.is_absent() {
                continue;
            }
            write!(f, "[{}] -> {} ", index + 1, item.sibling)?;
            self.write_value(f, item.key)?;
            f.write_str(" : ")?;
            self.write_value(f, item.value)?;
            writeln!(f)?;
        }
        Ok(())
    }
}
