//! Runtime values.
//!
//! A [`Value`] is what a [`Thunk`](crate::Thunk) evaluates to: a value in
//! weak head normal form. Compound values (lists and dictionaries) hold
//! thunks, so their contents may still be unevaluated.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::{Dictionary, Effect, Error, Function, List};

/// A value in weak head normal form.
#[derive(Clone)]
pub enum Value {
    /// The unit value.
    Nil,

    /// A boolean.
    Boolean(bool),

    /// A double-precision number.
    Number(f64),

    /// An immutable string.
    String(Arc<str>),

    /// A lazily-spined list.
    List(List),

    /// A persistent dictionary.
    Dictionary(Dictionary),

    /// A function.
    Function(Function),

    /// An error with a call trace.
    Error(Error),

    /// An impure computation, only unwrapped by impure evaluation.
    Effect(Effect),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::List(l) if l.is_empty() => write!(f, "[]"),
            Self::List(_) => write!(f, "[..]"),
            Self::Dictionary(d) => write!(f, "<dictionary of {}>", d.len()),
            Self::Function(func) => write!(f, "<function {}>", func.name()),
            Self::Error(e) => write!(f, "<error {e}>"),
            Self::Effect(_) => write!(f, "<effect>"),
        }
    }
}

/// The kind of a value, used in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    /// `nil`
    Nil,
    /// `true` or `false`
    Boolean,
    /// Numbers
    Number,
    /// Strings
    String,
    /// Lists
    List,
    /// Dictionaries
    Dictionary,
    /// Functions
    Function,
    /// Effects
    Effect,
    /// Errors
    Error,
}

impl Kind {
    /// The name of this kind as shown to users.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::List => "list",
            Self::Dictionary => "dictionary",
            Self::Function => "function",
            Self::Effect => "effect",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    /// The kind of this value.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Self::Nil => Kind::Nil,
            Self::Boolean(_) => Kind::Boolean,
            Self::Number(_) => Kind::Number,
            Self::String(_) => Kind::String,
            Self::List(_) => Kind::List,
            Self::Dictionary(_) => Kind::Dictionary,
            Self::Function(_) => Kind::Function,
            Self::Error(_) => Kind::Error,
            Self::Effect(_) => Kind::Effect,
        }
    }

    /// Returns true if this value is an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Build the `TypeError` raised when this value is not of the `expected`
    /// kind. An error value is returned as is.
    #[must_use]
    pub fn unexpected(self, expected: Kind) -> Error {
        match self {
            Self::Error(e) => e,
            other => Error::type_error(format!(
                "expected a {expected} but found a {}",
                other.kind()
            )),
        }
    }

    /// Unwrap a number.
    ///
    /// # Errors
    ///
    /// Returns the error itself for an error value and a `TypeError` for any
    /// other kind.
    pub fn into_number(self) -> Result<f64, Error> {
        match self {
            Self::Number(n) => Ok(n),
            other => Err(other.unexpected(Kind::Number)),
        }
    }

    /// Unwrap a boolean. See [`Value::into_number`] for errors.
    pub fn into_boolean(self) -> Result<bool, Error> {
        match self {
            Self::Boolean(b) => Ok(b),
            other => Err(other.unexpected(Kind::Boolean)),
        }
    }

    /// Unwrap a string. See [`Value::into_number`] for errors.
    pub fn into_string(self) -> Result<Arc<str>, Error> {
        match self {
            Self::String(s) => Ok(s),
            other => Err(other.unexpected(Kind::String)),
        }
    }

    /// Unwrap a list. See [`Value::into_number`] for errors.
    pub fn into_list(self) -> Result<List, Error> {
        match self {
            Self::List(l) => Ok(l),
            other => Err(other.unexpected(Kind::List)),
        }
    }

    /// Unwrap a dictionary. See [`Value::into_number`] for errors.
    pub fn into_dictionary(self) -> Result<Dictionary, Error> {
        match self {
            Self::Dictionary(d) => Ok(d),
            other => Err(other.unexpected(Kind::Dictionary)),
        }
    }

    /// Unwrap a function. See [`Value::into_number`] for errors.
    pub fn into_function(self) -> Result<Function, Error> {
        match self {
            Self::Function(f) => Ok(f),
            other => Err(other.unexpected(Kind::Function)),
        }
    }

    /// Split an error off, passing every other value through.
    ///
    /// # Errors
    ///
    /// Returns the error if this value is one.
    pub fn check(self) -> Result<Value, Error> {
        match self {
            Self::Error(e) => Err(e),
            other => Ok(other),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(Arc::from(s))
    }
}

impl From<Arc<str>> for Value {
    fn from(s: Arc<str>) -> Self {
        Self::String(s)
    }
}

impl From<List> for Value {
    fn from(l: List) -> Self {
        Self::List(l)
    }
}

impl From<Dictionary> for Value {
    fn from(d: Dictionary) -> Self {
        Self::Dictionary(d)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Self::Function(f)
    }
}

impl From<Effect> for Value {
    fn from(e: Effect) -> Self {
        Self::Effect(e)
    }
}

impl From<Error> for Value {
    fn from(e: Error) -> Self {
        Self::Error(e)
    }
}

impl<T: Into<Value>> From<Result<T, Error>> for Value {
    fn from(result: Result<T, Error>) -> Self {
        match result {
            Ok(v) => v.into(),
            Err(e) => Self::Error(e),
        }
    }
}

// ============================================================
// Identity
// ============================================================

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(0);

/// A process-unique identity for values compared by reference: functions and
/// effects.
pub(crate) fn next_identity() -> u64 {
    NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed)
}
