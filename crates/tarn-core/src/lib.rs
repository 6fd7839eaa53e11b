//! Evaluation core of the Tarn language.
//!
//! Tarn is a small, lazily evaluated functional language. Programs reach
//! this crate as a graph of [`Thunk`]s wired through [`Function`]s; nothing
//! is computed until a host forces a thunk.
//!
//! # Overview
//!
//! - [`Thunk`]: a shared suspended computation, forced at most once even
//!   under concurrent access
//! - [`Value`]: what a thunk evaluates to, in weak head normal form
//! - [`Signature`] and [`Arguments`]: parameter declarations and the lazy
//!   binder matching call sites against them
//! - [`List`] and [`Dictionary`]: the persistent collections
//! - [`Error`]: errors are values carrying a call trace
//! - [`Effect`]: impure computations, only run through
//!   [`Thunk::force_impure`]
//! - [`builtins`]: the primitive functions
//!
//! # Example
//!
//! ```ignore
//! use tarn_core::{builtins, Arguments, Thunk};
//!
//! let sum = Thunk::app(
//!     builtins::add(),
//!     Arguments::positional([Thunk::new(1.0), Thunk::new(2.0)]),
//! );
//! assert_eq!(sum.force().into_number()?, 3.0);
//! ```

#![warn(missing_docs)]

pub mod builtins;
pub mod compare;
pub mod list;

mod arguments;
mod dictionary;
mod effect;
mod error;
mod function;
mod letrec;
mod signature;
mod thunk;
mod value;

pub use arguments::{Arguments, KeywordArgument, PositionalArgument};
pub use dictionary::{Dictionary, Entry, Iter as DictionaryIter};
pub use effect::Effect;
pub use error::{Error, ErrorKind};
pub use function::{Function, LazyBody, StrictBody};
pub use letrec::LetrecGroup;
pub use list::List;
pub use signature::{DefaultFn, DefaultValue, OptionalParameter, Signature};
pub use tarn_span::Location;
pub use thunk::Thunk;
pub use value::{Kind, Value};
