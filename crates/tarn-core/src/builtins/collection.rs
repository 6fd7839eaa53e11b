//! List and dictionary primitives.
//!
//! Names shared by both collections (`size`, `index`, `include`, `delete`,
//! `to_list`, `merge`) dispatch on the kind of their first argument.

use crate::list;
use crate::{Dictionary, Error, Function, Kind, List, Signature, Thunk, Value};

use super::{lazy, position, strict};

/// `list(elements...)`
pub fn list() -> Function {
    lazy("list", Signature::new().rest_positionals("elements"), |args| {
        Ok(args[0].clone())
    })
}

/// `first(list)`
pub fn first() -> Function {
    strict("first", Signature::with_positionals(["list"]), |args| {
        args[0].clone().into_list()?.first()
    })
}

/// `rest(list)`
pub fn rest() -> Function {
    strict("rest", Signature::with_positionals(["list"]), |args| {
        args[0].clone().into_list()?.rest()
    })
}

/// `prepend(elements..., list)`: the last argument is the list; it is not
/// forced.
pub fn prepend() -> Function {
    lazy(
        "prepend",
        Signature::new().rest_positionals("elements_and_list"),
        |args| {
            let mut elements = args[0]
                .force()
                .into_list()?
                .iter()
                .collect::<Result<Vec<_>, _>>()?;
            let tail = elements
                .pop()
                .ok_or_else(|| Error::arity_error("prepend needs a list to prepend to"))?;
            Ok(list::prepend(elements, tail))
        },
    )
}

/// `size(collection)`
pub fn size() -> Function {
    strict("size", Signature::with_positionals(["collection"]), |args| {
        let size = match &args[0] {
            Value::List(list) => list.size()?,
            Value::Dictionary(dictionary) => dictionary.len(),
            Value::String(s) => s.chars().count(),
            other => return Err(not_a_collection(other)),
        };
        Ok(Thunk::new(size as f64))
    })
}

/// `index(collection, key)`: 1-based for lists and strings.
pub fn index() -> Function {
    strict(
        "index",
        Signature::with_positionals(["collection", "key"]),
        |args| match &args[0] {
            Value::List(list) => list.index(position(args[1].clone().into_number()?)?),
            Value::Dictionary(dictionary) => dictionary.index(&args[1]),
            Value::String(s) => {
                let n = position(args[1].clone().into_number()?)?;
                s.chars()
                    .nth(n - 1)
                    .map(|c| Thunk::new(c.to_string()))
                    .ok_or_else(|| Error::index_error(format!("index {n} is out of range")))
            }
            other => Err(not_a_collection(other)),
        },
    )
}

/// `include(collection, element)`: list membership, dictionary key
/// membership, or substring search.
pub fn include() -> Function {
    strict(
        "include",
        Signature::with_positionals(["collection", "element"]),
        |args| {
            let found = match &args[0] {
                Value::List(list) => list.contains(&args[1])?,
                Value::Dictionary(dictionary) => dictionary.contains_key(&args[1])?,
                Value::String(s) => s.contains(&*args[1].clone().into_string()?),
                other => return Err(not_a_collection(other)),
            };
            Ok(Thunk::new(found))
        },
    )
}

/// `delete(collection, key)`: removes a dictionary key or the list element at
/// a 1-based position.
pub fn delete() -> Function {
    strict(
        "delete",
        Signature::with_positionals(["collection", "key"]),
        |args| match &args[0] {
            Value::List(list) => Ok(Thunk::new(
                list.delete(position(args[1].clone().into_number()?)?)?,
            )),
            Value::Dictionary(dictionary) => Ok(Thunk::new(dictionary.remove(&args[1])?)),
            other => Err(not_a_collection(other)),
        },
    )
}

/// `to_list(collection)`: dictionaries become lists of `[key value]` pairs
/// and strings lists of characters.
pub fn to_list() -> Function {
    strict("to_list", Signature::with_positionals(["collection"]), |args| {
        match &args[0] {
            Value::List(list) => Ok(Thunk::new(list.clone())),
            Value::Dictionary(dictionary) => Ok(Thunk::new(dictionary.to_list())),
            Value::String(s) => Ok(Thunk::new(List::from_values(
                s.chars().map(|c| Value::from(c.to_string())),
            ))),
            other => Err(not_a_collection(other)),
        }
    })
}

/// `dictionary(key, value, key, value, ...)`
pub fn dictionary() -> Function {
    lazy(
        "dictionary",
        Signature::new().rest_positionals("key_values"),
        |args| {
            let pairs = args[0].force().into_list()?;
            Ok(Thunk::new(assign_pairs(Dictionary::new(), &pairs)?))
        },
    )
}

/// `assign(dictionary, key, value, key, value, ...)`
pub fn assign() -> Function {
    lazy(
        "assign",
        Signature::with_positionals(["dictionary"]).rest_positionals("key_values"),
        |args| {
            let dictionary = args[0].force().into_dictionary()?;
            let pairs = args[1].force().into_list()?;
            Ok(Thunk::new(assign_pairs(dictionary, &pairs)?))
        },
    )
}

fn assign_pairs(mut dictionary: Dictionary, pairs: &List) -> Result<Dictionary, Error> {
    let mut elements = pairs.iter();
    while let Some(key) = elements.next() {
        let key = key?.force().check()?;
        let value = elements.next().ok_or_else(|| {
            Error::arity_error("keys and values must come in pairs")
        })??;
        dictionary = dictionary.insert(key, value)?;
    }
    Ok(dictionary)
}

/// `merge(collection, others...)`: dictionaries merge with later ones
/// winning, lists concatenate lazily.
pub fn merge() -> Function {
    lazy(
        "merge",
        Signature::with_positionals(["collection"]).rest_positionals("others"),
        |args| match args[0].force() {
            Value::Dictionary(mut merged) => {
                for other in args[1].force().into_list()?.iter() {
                    merged = merged.merge(&other?.force().into_dictionary()?)?;
                }
                Ok(Thunk::new(merged))
            }
            Value::List(_) => Ok(list::append(args[0].clone(), concatenate(args[1].clone()))),
            other => Err(not_a_collection(&other)),
        },
    )
}

/// Lazily flatten a list of lists.
fn concatenate(lists: Thunk) -> Thunk {
    Thunk::suspend(move || match lists.force().into_list() {
        Ok(lists) => match lists.uncons() {
            None => Thunk::new(List::empty()),
            Some((head, rest)) => list::append(head.clone(), concatenate(rest.clone())),
        },
        Err(e) => Thunk::new(e),
    })
}

fn not_a_collection(value: &Value) -> Error {
    match value {
        Value::Error(e) => e.clone(),
        other => Error::type_error(format!(
            "expected a {}, {} or {} but found a {}",
            Kind::List,
            Kind::Dictionary,
            Kind::String,
            other.kind()
        )),
    }
}
