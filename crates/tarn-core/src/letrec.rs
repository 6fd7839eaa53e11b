//! Mutually recursive binding groups.
//!
//! Definitions in a group may refer to each other, and to themselves, before
//! any of them exists. Each definition gets a slot in a shared vector of
//! one-time cells; references are thunks that read their cell when forced.

use std::sync::{Arc, OnceLock};

use crate::{Error, Thunk};

/// A fixed set of one-time cells for mutually recursive definitions.
#[derive(Clone)]
pub struct LetrecGroup {
    cells: Arc<[OnceLock<Thunk>]>,
}

impl LetrecGroup {
    /// A group of `size` undefined cells.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            cells: (0..size).map(|_| OnceLock::new()).collect(),
        }
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true for a group without cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// A thunk that evaluates to the definition of cell `index`.
    ///
    /// Forcing it before the cell is defined yields a `ValueError`.
    #[must_use]
    pub fn reference(&self, index: usize) -> Thunk {
        let cells = Arc::clone(&self.cells);
        Thunk::suspend(move || match cells.get(index).and_then(OnceLock::get) {
            Some(definition) => definition.clone(),
            None => Thunk::new(Error::value_error(format!(
                "recursive binding {index} used before its definition"
            ))),
        })
    }

    /// Fill cell `index`.
    ///
    /// # Errors
    ///
    /// Returns a `ValueError` if the cell does not exist or is already
    /// defined.
    pub fn define(&self, index: usize, definition: Thunk) -> Result<(), Error> {
        let cell = self.cells.get(index).ok_or_else(|| {
            Error::value_error(format!(
                "recursive binding {index} is out of range for a group of {}",
                self.cells.len()
            ))
        })?;
        cell.set(definition).map_err(|_| {
            Error::value_error(format!("recursive binding {index} is already defined"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Arguments, ErrorKind, Function, List, Signature, Value};

    #[test]
    fn test_undefined_reference() {
        let group = LetrecGroup::new(1);
        let err = group.reference(0).force().check().unwrap_err();
        assert!(err.is(ErrorKind::ValueError));
    }

    #[test]
    fn test_define_twice() {
        let group = LetrecGroup::new(1);
        group.define(0, Thunk::new(1.0)).unwrap();
        assert!(group.define(0, Thunk::new(2.0)).is_err());
        assert!(group.define(5, Thunk::new(2.0)).is_err());
        assert_eq!(group.reference(0).force().into_number().unwrap(), 1.0);
    }

    #[test]
    fn test_self_referential_list() {
        // ones = prepend(1, ones)
        let group = LetrecGroup::new(1);
        let ones = Thunk::new(List::cons(Thunk::new(1.0), group.reference(0)));
        group.define(0, ones.clone()).unwrap();

        let third = ones.force().into_list().unwrap().index(3).unwrap();
        assert_eq!(third.force().into_number().unwrap(), 1.0);
    }

    #[test]
    fn test_mutual_recursion() {
        // even(n) = n == 0 or odd(n - 1); odd(n) = n != 0 and even(n - 1)
        let group = LetrecGroup::new(2);
        let parity = |other: usize, at_zero: bool| {
            let other = group.reference(other);
            Function::strict("parity", Signature::with_positionals(["n"]), move |args| {
                match args[0].clone().into_number() {
                    Ok(n) if n == 0.0 => Thunk::new(at_zero),
                    Ok(n) => Thunk::app_untraced(
                        other.clone(),
                        Arguments::positional([Thunk::new(n - 1.0)]),
                    ),
                    Err(e) => Thunk::new(e),
                }
            })
        };
        let even = parity(1, true);
        let odd = parity(0, false);
        group.define(0, Thunk::new(even.clone())).unwrap();
        group.define(1, Thunk::new(odd)).unwrap();

        let result = Thunk::app(even, Arguments::positional([Thunk::new(Value::Number(10.0))]));
        assert!(result.force().into_boolean().unwrap());
    }
}
