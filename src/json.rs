// datatree/src/json.rs

//! Tree Source and Tree Sink adapters for `serde_json` documents.
//!
//! Objects and arrays become tables (array elements are keyed `1..=n`).
//! Sibling order follows document order. Decoding always produces objects;
//! non-string keys are rendered with their display form.

use serde_json::{Map, Number, Value as JsonValue};

use crate::common::{NodeId, TreeConfig};
use crate::error::{DataTreeError, Result};
use crate::scalar::{Scalar, Value};
use crate::store::layout::TreeView;
use crate::tree::{Edge, EdgeValue, PackedTree, Packer, Subtree, TreeSink};

/// Edge list plus the root's head child, ready for `Packer::pack`.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeList {
    pub first_child: NodeId,
    pub edges: Vec<Edge>,
}

struct EdgeEmitter {
    next_id: NodeId,
    edges: Vec<Edge>,
}

impl EdgeEmitter {
    /// Allocates ids for all entries of one table, then recurses into nested tables.
    fn emit_table(&mut self, entries: Vec<(Scalar, &JsonValue)>) -> Result<NodeId> {
        if entries.is_empty() {
            return Ok(0);
        }
        let first = self.next_id;
        self.next_id = u32::try_from(entries.len())
            .ok()
            .and_then(|n| first.checked_add(n))
            .ok_or(DataTreeError::CapacityExceeded { what: "node id", limit: u32::MAX })?;

        let last = entries.len() - 1;
        for (i, (key, json)) in entries.into_iter().enumerate() {
            let node_id = first + i as u32;
            let sibling_id = if i < last { node_id + 1 } else { 0 };
            let value = match table_entries(json) {
                Some(children) => EdgeValue::Subtree(self.emit_table(children)?),
                None => EdgeValue::Scalar(scalar_from_json(json)?),
            };
            self.edges.push(Edge { node_id, sibling_id, key, value });
        }
        Ok(first)
    }
}

fn table_entries(json: &JsonValue) -> Option<Vec<(Scalar, &JsonValue)>> {
    match json {
        JsonValue::Object(map) => Some(map.iter().map(|(k, v)| (Scalar::Str(k.clone()), v)).collect()),
        JsonValue::Array(items) => {
            Some(items.iter().enumerate().map(|(i, v)| (Scalar::Int(i as i64 + 1), v)).collect())
        }
        _ => None,
    }
}

fn scalar_from_json(json: &JsonValue) -> Result<Scalar> {
    match json {
        JsonValue::Bool(b) => Ok(Scalar::Bool(*b)),
        JsonValue::String(s) => Ok(Scalar::Str(s.clone())),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Scalar::Int(i))
            } else if n.is_u64() {
                Err(DataTreeError::TypeError(format!("integer {} does not fit in i64", n)))
            } else {
                n.as_f64()
                    .map(Scalar::Real)
                    .ok_or_else(|| DataTreeError::TypeError(format!("unsupported number {}", n)))
            }
        }
        JsonValue::Null => Err(DataTreeError::TypeError("null has no datatree representation".into())),
        JsonValue::Object(_) | JsonValue::Array(_) => {
            Err(DataTreeError::TypeError("tables cannot be used as scalars".into()))
        }
    }
}

/// Flattens a JSON object or array into an edge list. Node ids start at 2.
pub fn edges_from_json(json: &JsonValue) -> Result<EdgeList> {
    let entries = table_entries(json)
        .ok_or_else(|| DataTreeError::TypeError("root must be a JSON object or array".into()))?;
    let mut emitter = EdgeEmitter { next_id: 2, edges: Vec::new() };
    let first_child = emitter.emit_table(entries)?;
    Ok(EdgeList { first_child, edges: emitter.edges })
}

pub fn pack_json(json: &JsonValue, config: TreeConfig) -> Result<PackedTree> {
    let list = edges_from_json(json)?;
    Packer::new(config)?.pack(list.first_child, &list.edges)
}

pub fn pack_json_str(text: &str) -> Result<PackedTree> {
    let json: JsonValue = serde_json::from_str(text)?;
    pack_json(&json, TreeConfig::default())
}

#[derive(Default)]
struct JsonSink {
    map: Map<String, JsonValue>,
}

fn json_key(key: Value<'_>) -> String {
    match key {
        Value::Str(s) => s.to_string(),
        other => other.to_string(),
    }
}

fn json_scalar(value: Value<'_>) -> Result<JsonValue> {
    Ok(match value {
        Value::Bool(b) => JsonValue::Bool(b),
        Value::Int(n) => JsonValue::from(n),
        Value::Real(f) => Number::from_f64(f)
            .map(JsonValue::Number)
            .ok_or_else(|| DataTreeError::TypeError(format!("{} has no JSON representation", f)))?,
        Value::Str(s) => JsonValue::String(s.to_string()),
        Value::Pointer(p) => JsonValue::from(p as u64),
        Value::Table(_) => return Err(DataTreeError::TypeError("table passed as scalar".into())),
    })
}

impl<'a> TreeSink<'a> for JsonSink {
    fn scalar(&mut self, key: Value<'a>, value: Value<'a>) -> Result<()> {
        self.map.insert(json_key(key), json_scalar(value)?);
        Ok(())
    }

    fn table(&mut self, key: Value<'a>, subtree: Subtree<'a>) -> Result<()> {
        let mut nested = JsonSink::default();
        subtree.decode_into(&mut nested)?;
        self.map.insert(json_key(key), JsonValue::Object(nested.map));
        Ok(())
    }
}

/// Decodes the table at `node_id` (and everything below it) into a JSON object.
pub fn to_json(view: &TreeView<'_>, node_id: NodeId) -> Result<JsonValue> {
    let mut sink = JsonSink::default();
    view.decode_into(node_id, &mut sink)?;
    Ok(JsonValue::Object(sink.map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_becomes_sibling_chain() {
        let list = edges_from_json(&json!({"a": 1, "b": "x"})).unwrap();
        assert_eq!(list.first_child, 2);
        assert_eq!(list.edges, vec![Edge::scalar(2, 3, "a", 1), Edge::scalar(3, 0, "b", "x")]);
    }

    #[test]
    fn nested_tables_get_their_own_chain() {
        let list = edges_from_json(&json!({"t": {"k": true}, "n": 2.5})).unwrap();
        assert_eq!(
            list.edges,
            vec![Edge::scalar(4, 0, "k", true), Edge::subtree(2, 3, "t", 4), Edge::scalar(3, 0, "n", 2.5)]
        );
    }

    #[test]
    fn arrays_are_keyed_from_one() {
        let list = edges_from_json(&json!(["x", "y"])).unwrap();
        assert_eq!(
            list.edges,
            vec![Edge::scalar(2, 3, Scalar::Int(1), "x"), Edge::scalar(3, 0, Scalar::Int(2), "y")]
        );
    }

    #[test]
    fn empty_containers_pack_as_empty_tables() {
        let tree = pack_json_str(r#"{"e": {}, "l": []}"#).unwrap();
        let view = tree.view().unwrap();
        assert_eq!(to_json(&view, 1).unwrap(), json!({"e": {}, "l": {}}));
    }

    #[test]
    fn unsupported_values_are_type_errors() {
        assert!(matches!(edges_from_json(&json!({"a": null})), Err(DataTreeError::TypeError(_))));
        assert!(matches!(edges_from_json(&json!({"a": u64::MAX})), Err(DataTreeError::TypeError(_))));
        assert!(matches!(edges_from_json(&json!(5)), Err(DataTreeError::TypeError(_))));
    }

    #[test]
    fn malformed_text_is_json_error() {
        assert!(matches!(pack_json_str("{"), Err(DataTreeError::Json { .. })));
    }
}
