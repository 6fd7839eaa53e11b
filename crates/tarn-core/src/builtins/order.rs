//! Equality and ordering primitives.

use std::cmp::Ordering;

use crate::compare as structural;
use crate::{Error, Function, Signature, Thunk, Value};

use super::{lazy, strict};

/// `equal(values...)`: whether every value equals the first.
pub fn equal() -> Function {
    lazy("equal", Signature::new().rest_positionals("values"), |args| {
        let mut values = args[0].force().into_list()?.iter();
        let Some(first) = values.next() else {
            return Ok(Thunk::new(true));
        };
        let first = first?.force();
        for value in values {
            if !structural::equal(&first, &value?.force())? {
                return Ok(Thunk::new(false));
            }
        }
        Ok(Thunk::new(true))
    })
}

/// `compare(left, right)`: -1, 0 or 1.
pub fn compare() -> Function {
    strict(
        "compare",
        Signature::with_positionals(["left", "right"]),
        |args| {
            let n = match structural::compare(&args[0], &args[1])? {
                Ordering::Less => -1.0,
                Ordering::Equal => 0.0,
                Ordering::Greater => 1.0,
            };
            Ok(Thunk::new(Value::Number(n)))
        },
    )
}

/// `less(values...)`: strictly ascending.
pub fn less() -> Function {
    chain("less", |o| o == Ordering::Less)
}

/// `less_eq(values...)`: ascending.
pub fn less_eq() -> Function {
    chain("less_eq", |o| o != Ordering::Greater)
}

/// `greater(values...)`: strictly descending.
pub fn greater() -> Function {
    chain("greater", |o| o == Ordering::Greater)
}

/// `greater_eq(values...)`: descending.
pub fn greater_eq() -> Function {
    chain("greater_eq", |o| o != Ordering::Less)
}

/// Check `accept` on each adjacent pair, stopping at the first rejection.
fn chain(name: &'static str, accept: fn(Ordering) -> bool) -> Function {
    lazy(name, Signature::new().rest_positionals("values"), move |args| {
        Ok(Thunk::new(ordered(&args[0], accept)?))
    })
}

fn ordered(values: &Thunk, accept: fn(Ordering) -> bool) -> Result<bool, Error> {
    let mut values = values.force().into_list()?.iter();
    let Some(first) = values.next() else {
        return Ok(true);
    };
    let mut previous = first?.force();
    for value in values {
        let current = value?.force();
        if !accept(structural::compare(&previous, &current)?) {
            return Ok(false);
        }
        previous = current;
    }
    Ok(true)
}
