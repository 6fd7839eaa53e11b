//! Core primitive functions.
//!
//! Every primitive is an ordinary [`Function`] value and binds its
//! arguments by the usual rules. The [`Prelude`] collects them by name for
//! the code that resolves free identifiers of a program.

mod collection;
mod control;
mod number;
mod order;
mod text;

pub use collection::{
    assign, delete, dictionary, first, include, index, list, merge, prepend, rest, size, to_list,
};
pub use control::{catch, effect, error, identity, if_, partial};
pub use number::{add, div, floor_div, modulo, mul, pow, sub};
pub use order::{compare, equal, greater, greater_eq, less, less_eq};
pub use text::{dump, dump_value, to_string, to_string_value};

use std::sync::{Arc, OnceLock};

use rustc_hash::FxHashMap;

use crate::{Error, Function, Signature, Thunk, Value};

/// Primitive functions by name.
#[derive(Clone, Default)]
pub struct Prelude {
    functions: FxHashMap<Arc<str>, Function>,
}

impl Prelude {
    /// A prelude holding every core primitive.
    #[must_use]
    pub fn new() -> Self {
        let mut prelude = Self::default();
        for function in [
            list(),
            first(),
            rest(),
            prepend(),
            size(),
            index(),
            include(),
            delete(),
            to_list(),
            dictionary(),
            assign(),
            merge(),
            equal(),
            compare(),
            less(),
            less_eq(),
            greater(),
            greater_eq(),
            add(),
            sub(),
            mul(),
            div(),
            floor_div(),
            modulo(),
            pow(),
            if_(),
            identity(),
            partial(),
            to_string(),
            dump(),
            error(),
            catch(),
            effect(),
        ] {
            prelude.insert(function);
        }
        prelude
    }

    /// The shared prelude of this process.
    pub fn global() -> &'static Prelude {
        static PRELUDE: OnceLock<Prelude> = OnceLock::new();
        PRELUDE.get_or_init(Prelude::new)
    }

    /// Add a function under its own name, replacing any previous one.
    pub fn insert(&mut self, function: Function) {
        self.functions.insert(Arc::from(function.name()), function);
    }

    /// Look a function up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// A thunk holding the named function.
    #[must_use]
    pub fn thunk(&self, name: &str) -> Option<Thunk> {
        self.get(name).map(|f| Thunk::new(f.clone()))
    }

    /// Names of all functions, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(|name| &**name)
    }
}

/// A strict primitive whose implementation may fail.
fn strict(
    name: &'static str,
    signature: Signature,
    body: impl Fn(&[Value]) -> Result<Thunk, Error> + Send + Sync + 'static,
) -> Function {
    Function::strict(name, signature, move |args| returning(body(args)))
}

/// A lazy primitive whose implementation may fail.
fn lazy(
    name: &'static str,
    signature: Signature,
    body: impl Fn(&[Thunk]) -> Result<Thunk, Error> + Send + Sync + 'static,
) -> Function {
    Function::lazy(name, signature, move |args| returning(body(args)))
}

fn returning(result: Result<Thunk, Error>) -> Thunk {
    match result {
        Ok(thunk) => thunk,
        Err(e) => Thunk::new(e),
    }
}

/// A 1-based position from a number.
fn position(n: f64) -> Result<usize, Error> {
    if n.fract() != 0.0 || n.is_nan() {
        return Err(Error::value_error(format!("{n} is not an integer index")));
    }
    if n < 1.0 {
        return Err(Error::index_error(format!("index {n} is out of range")));
    }
    Ok(n as usize)
}
