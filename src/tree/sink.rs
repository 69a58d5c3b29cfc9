// datatree/src/tree/sink.rs

use crate::common::NodeId;
use crate::error::Result;
use crate::scalar::Value;
use crate::store::layout::TreeView;

use super::walk::Children;

/// Consumer of decoded pairs, fed one at a time in sibling-chain order.
pub trait TreeSink<'a> {
    fn scalar(&mut self, key: Value<'a>, value: Value<'a>) -> Result<()>;

    /// Called for a table-valued pair. The sink decides whether, and how, to
    /// descend through `subtree`.
    fn table(&mut self, key: Value<'a>, subtree: Subtree<'a>) -> Result<()>;
}

/// Continuation for a nested table found during decode.
#[derive(Debug, Clone, Copy)]
pub struct Subtree<'a> {
    view: TreeView<'a>,
    node_id: NodeId,
}

impl<'a> Subtree<'a> {
    pub(crate) fn new(view: TreeView<'a>, node_id: NodeId) -> Self {
        Self { view, node_id }
    }

    /// Id of the item holding the table.
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn children(&self) -> Result<Children<'a>> {
        self.view.children(self.node_id)
    }

    pub fn decode_into<S: TreeSink<'a>>(&self, sink: &mut S) -> Result<()> {
        self.view.decode_into(self.node_id, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::pack::{pack, Edge};

    /// Flattens a tree into dotted paths.
    #[derive(Default)]
    struct Paths {
        prefix: String,
        out: Vec<String>,
    }

    impl<'a> TreeSink<'a> for Paths {
        fn scalar(&mut self, key: Value<'a>, value: Value<'a>) -> Result<()> {
            self.out.push(format!("{}{}={}", self.prefix, key, value));
            Ok(())
        }

        fn table(&mut self, key: Value<'a>, subtree: Subtree<'a>) -> Result<()> {
            let mut nested = Paths { prefix: format!("{}{}.", self.prefix, key), out: Vec::new() };
            subtree.decode_into(&mut nested)?;
            self.out.append(&mut nested.out);
            Ok(())
        }
    }

    #[test]
    fn sink_receives_pairs_and_recurses_on_demand() {
        let tree = pack(
            2,
            &[
                Edge::scalar(2, 3, "name", "tree"),
                Edge::subtree(3, 0, "size", 4),
                Edge::scalar(4, 5, "w", 3),
                Edge::scalar(5, 0, "h", -4),
            ],
        )
        .unwrap();
        let view = tree.view().unwrap();
        let mut paths = Paths::default();
        view.decode_into(1, &mut paths).unwrap();
        assert_eq!(paths.out, vec!["name=tree", "size.w=3", "size.h=-4"]);
    }

    #[test]
    fn sink_may_skip_subtrees() {
        struct TopLevel(Vec<NodeId>);
        impl<'a> TreeSink<'a> for TopLevel {
            fn scalar(&mut self, _key: Value<'a>, _value: Value<'a>) -> Result<()> {
                Ok(())
            }
            fn table(&mut self, _key: Value<'a>, subtree: Subtree<'a>) -> Result<()> {
                self.0.push(subtree.node_id());
                Ok(())
            }
        }

        let tree = pack(2, &[Edge::subtree(2, 0, "t", 3), Edge::scalar(3, 0, "k", 1)]).unwrap();
        let mut top = TopLevel(Vec::new());
        tree.view().unwrap().decode_into(1, &mut top).unwrap();
        assert_eq!(top.0, vec![2]);
    }
}
