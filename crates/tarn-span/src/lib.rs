//! Source location tracking for Tarn.
//!
//! Errors in Tarn carry a call trace: the sequence of call sites an error
//! value passed through while it propagated. This crate provides the
//! [`Location`] type stored in those traces.

#![warn(missing_docs)]

use std::fmt;
use std::sync::Arc;

/// A call site: file name plus 1-indexed line and column.
///
/// Locations are cheap to clone; the file name is shared.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    file: Arc<str>,
    line: u32,
    col: u32,
}

impl Location {
    /// Create a location from its parts.
    #[must_use]
    pub fn new(file: impl Into<Arc<str>>, line: u32, col: u32) -> Self {
        Self {
            file: file.into(),
            line,
            col,
        }
    }

    /// The location of the Rust code calling the surrounding
    /// `#[track_caller]` function.
    ///
    /// Applications built in Rust use this so they still show up in call
    /// traces.
    #[must_use]
    #[track_caller]
    pub fn caller() -> Self {
        let caller = std::panic::Location::caller();
        Self::new(caller.file(), caller.line(), caller.column())
    }

    /// The file name.
    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }

    /// 1-indexed line number.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// 1-indexed column number, in UTF-8 code units.
    #[must_use]
    pub fn col(&self) -> u32 {
        self.col
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.col)
    }
}
