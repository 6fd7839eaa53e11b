//! Property tests for tarn-core
//!
//! These tests verify the laws of the persistent collections and of
//! structural comparison.

use proptest::prelude::*;
use tarn_core::compare;
use tarn_core::{Dictionary, List, Thunk, Value};

/// Scalar keys and values. Numbers are small integers so that collisions
/// between generated keys actually happen.
fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Nil),
        any::<bool>().prop_map(Value::Boolean),
        (-20i32..20).prop_map(|n| Value::Number(f64::from(n))),
        "[a-e]{0,3}".prop_map(Value::from),
    ]
}

/// Scalars, and lists of scalars as compound keys.
fn key() -> impl Strategy<Value = Value> {
    prop_oneof![
        3 => scalar(),
        1 => prop::collection::vec(scalar(), 0..4).prop_map(|vs| Value::List(List::from_values(vs))),
    ]
}

fn entries() -> impl Strategy<Value = Vec<(Value, Value)>> {
    prop::collection::vec((key(), scalar()), 0..40)
}

fn build(entries: &[(Value, Value)]) -> Dictionary {
    let mut dictionary = Dictionary::new();
    for (k, v) in entries {
        dictionary = dictionary.insert(k.clone(), Thunk::new(v.clone())).unwrap();
    }
    dictionary
}

fn equal(a: &Value, b: &Value) -> bool {
    compare::equal(a, b).unwrap()
}

fn dictionaries_equal(a: &Dictionary, b: &Dictionary) -> bool {
    equal(&Value::Dictionary(a.clone()), &Value::Dictionary(b.clone()))
}

/// Value under `key`, or `None`.
fn lookup(dictionary: &Dictionary, key: &Value) -> Option<Value> {
    dictionary.get(key).unwrap().map(|t| t.force())
}

// ============================================================
// Dictionary properties
// ============================================================

proptest! {
    #[test]
    fn dictionary_round_trip_through_to_list(entries in entries()) {
        let original = build(&entries);

        let mut replayed = Dictionary::new();
        for pair in original.to_list().iter() {
            let pair = pair.unwrap().force().into_list().unwrap();
            let key = pair.index(1).unwrap().force();
            let value = pair.index(2).unwrap();
            replayed = replayed.insert(key, value).unwrap();
        }

        prop_assert_eq!(replayed.len(), original.len());
        prop_assert!(dictionaries_equal(&replayed, &original));
    }

    #[test]
    fn dictionary_duplicate_assignment_keeps_size(
        entries in entries(),
        k in key(),
        first in scalar(),
        second in scalar(),
    ) {
        let base = build(&entries);
        let once = base.insert(k.clone(), Thunk::new(first)).unwrap();
        let twice = once.insert(k.clone(), Thunk::new(second.clone())).unwrap();

        prop_assert_eq!(once.len(), twice.len());
        prop_assert!(equal(&lookup(&twice, &k).unwrap(), &second));
    }

    #[test]
    fn dictionary_last_writer_wins(entries in entries()) {
        let dictionary = build(&entries);
        for (k, _) in &entries {
            let last = entries.iter().rev().find(|(other, _)| equal(other, k)).unwrap();
            prop_assert!(equal(&lookup(&dictionary, k).unwrap(), &last.1));
        }
    }

    #[test]
    fn dictionary_remove_then_lookup(entries in entries(), k in key()) {
        let dictionary = build(&entries);
        let removed = dictionary.remove(&k).unwrap();

        prop_assert!(lookup(&removed, &k).is_none());
        let present = dictionary.contains_key(&k).unwrap();
        prop_assert_eq!(removed.len() + usize::from(present), dictionary.len());
        // The original version is untouched.
        prop_assert_eq!(lookup(&dictionary, &k).is_some(), present);
    }

    #[test]
    fn dictionary_insertion_order_is_irrelevant(entries in entries()) {
        // Deduplicate first so that order cannot change which value wins.
        let mut unique: Vec<(Value, Value)> = Vec::new();
        for (k, v) in entries {
            if !unique.iter().any(|(other, _)| equal(other, &k)) {
                unique.push((k, v));
            }
        }
        let forward = build(&unique);
        unique.reverse();
        let backward = build(&unique);

        prop_assert!(dictionaries_equal(&forward, &backward));
        prop_assert_eq!(
            compare::hash(&Value::Dictionary(forward)).unwrap(),
            compare::hash(&Value::Dictionary(backward)).unwrap()
        );
    }

    #[test]
    fn merge_right_operand_wins(a in entries(), b in entries()) {
        let left = build(&a);
        let right = build(&b);
        let merged = left.merge(&right).unwrap();

        for (k, _) in a.iter().chain(b.iter()) {
            let expected = match lookup(&right, k) {
                Some(v) => v,
                None => lookup(&left, k).unwrap(),
            };
            prop_assert!(equal(&lookup(&merged, k).unwrap(), &expected));
        }

        // Merging is assigning every entry of the right side in turn.
        let mut assigned = left.clone();
        for (k, v) in right.iter() {
            assigned = assigned.insert(k.clone(), v.clone()).unwrap();
        }
        prop_assert!(dictionaries_equal(&merged, &assigned));
    }

    #[test]
    fn merge_is_associative(a in entries(), b in entries(), c in entries()) {
        let (a, b, c) = (build(&a), build(&b), build(&c));
        let left = a.merge(&b).unwrap().merge(&c).unwrap();
        let right = a.merge(&b.merge(&c).unwrap()).unwrap();
        prop_assert!(dictionaries_equal(&left, &right));
    }
}

// ============================================================
// Comparison properties
// ============================================================

/// Nested values up to a small depth.
fn value() -> impl Strategy<Value = Value> {
    key().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4)
                .prop_map(|vs| Value::List(List::from_values(vs))),
            prop::collection::vec((scalar(), inner), 0..4).prop_map(|entries| {
                Value::Dictionary(
                    Dictionary::from_entries(
                        entries.into_iter().map(|(k, v)| (k, Thunk::new(v))),
                    )
                    .unwrap(),
                )
            }),
        ]
    })
}

proptest! {
    #[test]
    fn equality_is_reflexive(v in value()) {
        prop_assert!(equal(&v, &v));
        prop_assert_eq!(compare::compare(&v, &v).unwrap(), std::cmp::Ordering::Equal);
    }

    #[test]
    fn equality_is_symmetric(a in value(), b in value()) {
        prop_assert_eq!(equal(&a, &b), equal(&b, &a));
    }

    #[test]
    fn ordering_is_antisymmetric(a in value(), b in value()) {
        let forward = compare::compare(&a, &b).unwrap();
        let backward = compare::compare(&b, &a).unwrap();
        prop_assert_eq!(forward, backward.reverse());
        prop_assert_eq!(forward.is_eq(), equal(&a, &b));
    }

    #[test]
    fn equal_values_hash_equally(a in value(), b in value()) {
        if equal(&a, &b) {
            prop_assert_eq!(compare::hash(&a).unwrap(), compare::hash(&b).unwrap());
        }
    }

    #[test]
    fn independently_built_lists_are_equal(vs in prop::collection::vec(scalar(), 0..10)) {
        let a = Value::List(List::from_values(vs.clone()));
        let b = Value::List(List::from_values(vs));
        prop_assert!(equal(&a, &b));
        prop_assert_eq!(compare::hash(&a).unwrap(), compare::hash(&b).unwrap());
    }
}
