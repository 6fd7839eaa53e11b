//! Structural equality, ordering and hashing of values.
//!
//! All three may need to force nested thunks, so they return the first
//! [`Error`] they meet instead of a plain answer. Comparing or hashing an
//! error value fails with that error.
//!
//! Values of different kinds order by kind:
//! nil < boolean < number < string < list < dictionary < function < effect.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::{Dictionary, Error, Value};

/// Structural equality.
///
/// # Errors
///
/// Returns the first error met while forcing the values' contents.
pub fn equal(a: &Value, b: &Value) -> Result<bool, Error> {
    Ok(compare(a, b)? == Ordering::Equal)
}

/// Total order over values.
///
/// # Errors
///
/// Returns the first error met while forcing the values' contents.
pub fn compare(a: &Value, b: &Value) -> Result<Ordering, Error> {
    match (a, b) {
        (Value::Error(e), _) | (_, Value::Error(e)) => Err(e.clone()),
        (Value::Nil, Value::Nil) => Ok(Ordering::Equal),
        (Value::Boolean(x), Value::Boolean(y)) => Ok(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => Ok(compare_numbers(*x, *y)),
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        (Value::List(x), Value::List(y)) => x.compare_with(y, compare),
        (Value::Dictionary(x), Value::Dictionary(y)) => compare_dictionaries(x, y),
        (Value::Function(x), Value::Function(y)) => Ok(x.id().cmp(&y.id())),
        (Value::Effect(x), Value::Effect(y)) => Ok(x.id().cmp(&y.id())),
        _ => Ok(rank(a).cmp(&rank(b))),
    }
}

/// Structural hash, consistent with [`equal`].
///
/// # Errors
///
/// Returns the first error met while forcing the value's contents.
pub fn hash(value: &Value) -> Result<u64, Error> {
    let mut hasher = FxHasher::default();
    hash_into(value, &mut hasher)?;
    Ok(hasher.finish())
}

fn hash_into(value: &Value, hasher: &mut FxHasher) -> Result<(), Error> {
    rank(value).hash(hasher);
    match value {
        Value::Error(e) => return Err(e.clone()),
        Value::Nil => {}
        Value::Boolean(b) => b.hash(hasher),
        Value::Number(n) => canonical_bits(*n).hash(hasher),
        Value::String(s) => s.hash(hasher),
        Value::List(list) => {
            for element in list.iter() {
                hasher.write_u64(hash(&element?.force())?);
            }
        }
        Value::Dictionary(dictionary) => {
            // Entry order depends on the trie shape, so combine commutatively.
            let mut combined = 0u64;
            for (key, value) in dictionary.iter() {
                let mut entry = FxHasher::default();
                entry.write_u64(hash(key)?);
                entry.write_u64(hash(&value.force())?);
                combined = combined.wrapping_add(entry.finish());
            }
            dictionary.len().hash(hasher);
            combined.hash(hasher);
        }
        Value::Function(f) => f.id().hash(hasher),
        Value::Effect(e) => e.id().hash(hasher),
    }
    Ok(())
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Nil => 0,
        Value::Boolean(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::List(_) => 4,
        Value::Dictionary(_) => 5,
        Value::Function(_) => 6,
        Value::Effect(_) => 7,
        Value::Error(_) => 8,
    }
}

/// NaN equals NaN and sorts above every other number.
fn compare_numbers(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

fn canonical_bits(n: f64) -> u64 {
    if n.is_nan() {
        f64::NAN.to_bits()
    } else if n == 0.0 {
        0
    } else {
        n.to_bits()
    }
}

fn compare_dictionaries(x: &Dictionary, y: &Dictionary) -> Result<Ordering, Error> {
    match x.len().cmp(&y.len()) {
        Ordering::Equal => {}
        unequal => return Ok(unequal),
    }
    if x.ptr_eq(y) {
        return Ok(Ordering::Equal);
    }

    let xs = x.sorted_entries()?;
    let ys = y.sorted_entries()?;
    for ((xk, xv), (yk, yv)) in xs.iter().zip(&ys) {
        match compare(xk, yk)? {
            Ordering::Equal => {}
            unequal => return Ok(unequal),
        }
        if !xv.ptr_eq(yv) {
            match compare(&xv.force(), &yv.force())? {
                Ordering::Equal => {}
                unequal => return Ok(unequal),
            }
        }
    }
    Ok(Ordering::Equal)
}
