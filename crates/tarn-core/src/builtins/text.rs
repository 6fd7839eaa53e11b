//! Converting values to strings.
//!
//! `to_string` shows a string as its contents; `dump` quotes it. Elements of
//! lists and dictionaries are always dumped. Dictionary entries are shown in
//! key order so equal dictionaries print the same.

use crate::{Error, Function, Signature, Thunk, Value};

use super::strict;

/// `to_string(value)`
pub fn to_string() -> Function {
    strict("to_string", Signature::with_positionals(["value"]), |args| {
        Ok(Thunk::new(to_string_value(&args[0])?))
    })
}

/// `dump(value)`
pub fn dump() -> Function {
    strict("dump", Signature::with_positionals(["value"]), |args| {
        Ok(Thunk::new(dump_value(&args[0])?))
    })
}

/// Render a value, showing strings unquoted. Forces the whole value.
///
/// # Errors
///
/// Returns the first error contained in the value.
pub fn to_string_value(value: &Value) -> Result<String, Error> {
    match value {
        Value::String(s) => Ok(s.to_string()),
        other => dump_value(other),
    }
}

/// Render a value, showing strings quoted. Forces the whole value.
///
/// # Errors
///
/// Returns the first error contained in the value.
pub fn dump_value(value: &Value) -> Result<String, Error> {
    let mut out = String::new();
    render(value, &mut out)?;
    Ok(out)
}

fn render(value: &Value, out: &mut String) -> Result<(), Error> {
    match value {
        Value::Nil => out.push_str("nil"),
        Value::Boolean(b) => out.push_str(&format!("{b}")),
        Value::Number(n) => out.push_str(&format!("{n}")),
        Value::String(s) => out.push_str(&format!("{s:?}")),
        Value::List(list) => {
            out.push('[');
            for (i, element) in list.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                render(&element?.force(), out)?;
            }
            out.push(']');
        }
        Value::Dictionary(dictionary) => {
            out.push('{');
            for (i, (key, value)) in dictionary.sorted_entries()?.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                render(key, out)?;
                out.push(' ');
                render(&value.force(), out)?;
            }
            out.push('}');
        }
        Value::Function(f) => out.push_str(&format!("<function {}>", f.name())),
        Value::Effect(_) => out.push_str("<effect>"),
        Value::Error(e) => return Err(e.clone()),
    }
    Ok(())
}
