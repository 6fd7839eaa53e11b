//! Language-level errors.
//!
//! An [`Error`] is an ordinary value: it is produced by failing operations,
//! stored in thunks like any other result, and propagated by every operation
//! that inspects it. Each application an error passes through prepends its
//! call site to the error's call trace.

use std::fmt;
use std::sync::Arc;

use tarn_span::Location;

/// Names of the errors raised by the evaluation core itself.
///
/// Builtins outside the core may raise errors with any other name; those
/// round-trip through [`Error`] unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A value of the wrong kind was supplied.
    TypeError,
    /// Arguments did not match a function signature.
    ArityError,
    /// A dictionary lookup missed.
    KeyError,
    /// An effect was forced outside of impure evaluation.
    ImpureFunctionError,
    /// `first` or `rest` of an empty list.
    EmptyListError,
    /// A value of the right kind but an unusable content.
    ValueError,
    /// A list or string index was out of range.
    IndexError,
    /// A thunk depends on its own value.
    InfiniteLoopError,
    /// A native implementation panicked or the runtime could not serve it.
    InternalError,
}

impl ErrorKind {
    /// The stable name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TypeError => "TypeError",
            Self::ArityError => "ArityError",
            Self::KeyError => "KeyError",
            Self::ImpureFunctionError => "ImpureFunctionError",
            Self::EmptyListError => "EmptyListError",
            Self::ValueError => "ValueError",
            Self::IndexError => "IndexError",
            Self::InfiniteLoopError => "InfiniteLoopError",
            Self::InternalError => "InternalError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error value with a call trace.
///
/// The call trace lists the call sites the error propagated through,
/// outermost first.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{name}: {message}")]
pub struct Error {
    name: Arc<str>,
    message: Arc<str>,
    call_trace: im::Vector<Location>,
}

impl Error {
    /// Create an error with an empty call trace.
    pub fn new(name: impl Into<Arc<str>>, message: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            call_trace: im::Vector::new(),
        }
    }

    /// Create an error of one of the core kinds.
    pub fn of_kind(kind: ErrorKind, message: impl Into<Arc<str>>) -> Self {
        Self::new(kind.as_str(), message)
    }

    /// A `TypeError`.
    pub fn type_error(message: impl Into<Arc<str>>) -> Self {
        Self::of_kind(ErrorKind::TypeError, message)
    }

    /// An `ArityError`.
    pub fn arity_error(message: impl Into<Arc<str>>) -> Self {
        Self::of_kind(ErrorKind::ArityError, message)
    }

    /// A `KeyError`.
    pub fn key_error(message: impl Into<Arc<str>>) -> Self {
        Self::of_kind(ErrorKind::KeyError, message)
    }

    /// An `ImpureFunctionError`.
    pub fn impure_function_error(message: impl Into<Arc<str>>) -> Self {
        Self::of_kind(ErrorKind::ImpureFunctionError, message)
    }

    /// An `EmptyListError`.
    pub fn empty_list_error() -> Self {
        Self::of_kind(ErrorKind::EmptyListError, "the list is empty")
    }

    /// A `ValueError`.
    pub fn value_error(message: impl Into<Arc<str>>) -> Self {
        Self::of_kind(ErrorKind::ValueError, message)
    }

    /// An `IndexError`.
    pub fn index_error(message: impl Into<Arc<str>>) -> Self {
        Self::of_kind(ErrorKind::IndexError, message)
    }

    /// An `InfiniteLoopError`.
    pub fn infinite_loop_error() -> Self {
        Self::of_kind(
            ErrorKind::InfiniteLoopError,
            "a value depends on itself",
        )
    }

    /// An `InternalError`.
    pub fn internal_error(message: impl Into<Arc<str>>) -> Self {
        Self::of_kind(ErrorKind::InternalError, message)
    }

    /// The error name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Call sites this error propagated through, outermost first.
    #[must_use]
    pub fn call_trace(&self) -> &im::Vector<Location> {
        &self.call_trace
    }

    /// Whether this error has the name of the given core kind.
    #[must_use]
    pub fn is(&self, kind: ErrorKind) -> bool {
        &*self.name == kind.as_str()
    }

    /// Return this error with `location` added as the new outermost entry of
    /// its call trace. Name and message are kept.
    #[must_use]
    pub fn prepend(&self, location: Location) -> Self {
        let mut call_trace = self.call_trace.clone();
        call_trace.push_front(location);
        Self {
            name: Arc::clone(&self.name),
            message: Arc::clone(&self.message),
            call_trace,
        }
    }

    /// Render the error with its call trace, one location per line.
    #[must_use]
    pub fn lines(&self) -> String {
        let mut out = String::new();
        for location in &self.call_trace {
            out.push_str(&location.to_string());
            out.push('\n');
        }
        out.push_str(&self.to_string());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::new("MyError", "something broke");
        assert_eq!(err.to_string(), "MyError: something broke");
    }

    #[test]
    fn test_kind_names() {
        assert!(Error::empty_list_error().is(ErrorKind::EmptyListError));
        assert!(Error::type_error("x").is(ErrorKind::TypeError));
        assert!(!Error::type_error("x").is(ErrorKind::KeyError));
        assert_eq!(ErrorKind::InfiniteLoopError.to_string(), "InfiniteLoopError");
    }

    #[test]
    fn test_prepend_keeps_name_and_message() {
        let err = Error::value_error("bad")
            .prepend(Location::new("a.tarn", 3, 1))
            .prepend(Location::new("a.tarn", 1, 5));

        assert_eq!(err.name(), "ValueError");
        assert_eq!(err.message(), "bad");
        let trace: Vec<_> = err.call_trace().iter().map(ToString::to_string).collect();
        assert_eq!(trace, ["a.tarn:1:5", "a.tarn:3:1"]);
    }

    #[test]
    fn test_lines() {
        let err = Error::key_error("missing").prepend(Location::new("m.tarn", 2, 4));
        assert_eq!(err.lines(), "m.tarn:2:4\nKeyError: missing");
    }
}
