// datatree/tests/properties.rs

use std::collections::HashSet;

use datatree::common::MAX_PAYLOAD;
use datatree::{pack, DataTreeError, Edge, Packer, Result, Scalar, TreeConfig, Value};
use proptest::prelude::*;

fn scalar() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        any::<bool>().prop_map(Scalar::Bool),
        any::<i64>().prop_map(Scalar::Int),
        (0..=MAX_PAYLOAD as i64).prop_map(Scalar::Int),
        (-4i64..0).prop_map(Scalar::Int),
        (0usize..4).prop_map(Scalar::Pointer),
        (-1.0e12f64..1.0e12).prop_map(Scalar::Real),
        "[a-z]{0,8}".prop_map(Scalar::Str),
    ]
}

/// One flat table, chained 2 -> 3 -> ... in input order.
fn flat_edges(pairs: &[(Scalar, Scalar)]) -> Vec<Edge> {
    let last = pairs.len() as u32 + 1;
    pairs
        .iter()
        .enumerate()
        .map(|(i, (key, value))| {
            let node_id = i as u32 + 2;
            let sibling_id = if node_id == last { 0 } else { node_id + 1 };
            Edge::scalar(node_id, sibling_id, key.clone(), value.clone())
        })
        .collect()
}

fn pool_key(scalar: &Scalar) -> Option<String> {
    match scalar {
        Scalar::Bool(_) => None,
        Scalar::Int(n) if (0..=MAX_PAYLOAD as i64).contains(n) => None,
        Scalar::Int(n) => Some(format!("i:{}", n)),
        Scalar::Real(f) => Some(format!("r:{}", f.to_bits())),
        Scalar::Str(s) => Some(format!("s:{}", s)),
        Scalar::Pointer(p) => Some(format!("p:{}", p)),
    }
}

proptest! {
    #[test]
    fn flat_tables_round_trip(pairs in proptest::collection::vec((scalar(), scalar()), 1..48)) {
        let tree = pack(2, &flat_edges(&pairs)).unwrap();
        let entries: Vec<_> = tree.root().unwrap().collect::<Result<_>>().unwrap();
        prop_assert_eq!(entries.len(), pairs.len());
        for (entry, (key, value)) in entries.iter().zip(&pairs) {
            prop_assert_eq!(entry.key, key.clone());
            prop_assert_eq!(entry.value, value.clone());
        }
    }

    #[test]
    fn pool_holds_each_distinct_constant_once(pairs in proptest::collection::vec((scalar(), scalar()), 1..48)) {
        let expected: HashSet<String> = pairs
            .iter()
            .flat_map(|(k, v)| [pool_key(k), pool_key(v)])
            .flatten()
            .collect();
        let tree = pack(2, &flat_edges(&pairs)).unwrap();
        prop_assert_eq!(tree.view().unwrap().constant_count() as usize, expected.len());
    }

    #[test]
    fn small_ints_and_bools_stay_inline(values in proptest::collection::vec(0..=MAX_PAYLOAD as i64, 1..32), flag in any::<bool>()) {
        let pairs: Vec<_> = values.iter().map(|&n| (Scalar::Bool(flag), Scalar::Int(n))).collect();
        let tree = pack(2, &flat_edges(&pairs)).unwrap();
        prop_assert_eq!(tree.view().unwrap().constant_count(), 0);
        let decoded: Vec<_> = tree.root().unwrap().map(|e| e.unwrap().value).collect();
        let expected: Vec<_> = values.iter().map(|&n| Value::Int(n)).collect();
        prop_assert_eq!(decoded, expected);
    }

    #[test]
    fn pool_capacity_is_an_error_not_a_panic(count in 1usize..24, limit in 0u32..24) {
        let pairs: Vec<_> = (0..count).map(|i| (Scalar::Str(format!("k{}", i)), Scalar::Bool(true))).collect();
        let config = TreeConfig { max_constant_id: limit, ..TreeConfig::default() };
        let result = Packer::new(config).unwrap().pack(2, &flat_edges(&pairs));
        if count > limit as usize + 1 {
            prop_assert!(
                matches!(result, Err(DataTreeError::CapacityExceeded { .. })),
                "expected a capacity error"
            );
        } else {
            prop_assert!(result.is_ok());
        }
    }

    #[test]
    fn walks_never_exceed_item_count(next in proptest::collection::vec(0u32..12, 1..10)) {
        // arbitrary sibling links, cycles included
        let max = next.len() as u32 + 1;
        let edges: Vec<_> = next
            .iter()
            .enumerate()
            .map(|(i, &s)| Edge::scalar(i as u32 + 2, if s < 2 || s > max { 0 } else { s }, "k", 1))
            .collect();
        let tree = pack(2, &edges).unwrap();
        let budget = tree.view().unwrap().item_count() as usize;
        prop_assert!(tree.root().unwrap().count() <= budget + 1);
    }
}
