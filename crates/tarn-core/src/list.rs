//! Persistent, lazily-spined lists.
//!
//! A list is either empty or a cons cell of a head thunk and a tail thunk.
//! Neither part needs to be evaluated, so a tail may stand for an unbounded
//! or still-arriving sequence.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::compare::equal;
use crate::{Error, Thunk, Value};

/// An immutable list.
#[derive(Clone, Default)]
pub struct List(Option<Arc<Cell>>);

struct Cell {
    head: Thunk,
    tail: Thunk,
}

impl std::fmt::Debug for List {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "[]")
        } else {
            write!(f, "[..]")
        }
    }
}

impl List {
    /// The empty list.
    #[must_use]
    pub fn empty() -> Self {
        Self(None)
    }

    /// A cons cell. `tail` must evaluate to a list.
    #[must_use]
    pub fn cons(head: Thunk, tail: Thunk) -> Self {
        Self(Some(Arc::new(Cell { head, tail })))
    }

    /// A list of the given thunks.
    pub fn from_thunks(thunks: impl IntoIterator<Item = Thunk>) -> Self {
        let thunks: Vec<Thunk> = thunks.into_iter().collect();
        thunks
            .into_iter()
            .rev()
            .fold(Self::empty(), |tail, head| Self::cons(head, Thunk::new(tail)))
    }

    /// A list of the given values.
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        Self::from_thunks(values.into_iter().map(Thunk::new))
    }

    /// Returns true for the empty list.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Head and tail of a cons cell.
    #[must_use]
    pub fn uncons(&self) -> Option<(&Thunk, &Thunk)> {
        self.0.as_deref().map(|cell| (&cell.head, &cell.tail))
    }

    /// The first element.
    ///
    /// # Errors
    ///
    /// Returns an `EmptyListError` for the empty list.
    pub fn first(&self) -> Result<Thunk, Error> {
        self.uncons()
            .map(|(head, _)| head.clone())
            .ok_or_else(Error::empty_list_error)
    }

    /// Everything after the first element.
    ///
    /// # Errors
    ///
    /// Returns an `EmptyListError` for the empty list.
    pub fn rest(&self) -> Result<Thunk, Error> {
        self.uncons()
            .map(|(_, tail)| tail.clone())
            .ok_or_else(Error::empty_list_error)
    }

    /// Iterate over the element thunks, forcing the spine as it goes.
    ///
    /// A tail that does not evaluate to a list yields one error and ends the
    /// iteration.
    #[must_use]
    pub fn iter(&self) -> Iter {
        Iter {
            rest: Some(Thunk::new(self.clone())),
        }
    }

    /// Number of elements. Forces the whole spine.
    ///
    /// # Errors
    ///
    /// Returns the error a tail evaluates to.
    pub fn size(&self) -> Result<usize, Error> {
        let mut size = 0;
        for element in self.iter() {
            element?;
            size += 1;
        }
        Ok(size)
    }

    /// The element at a 1-based position.
    ///
    /// # Errors
    ///
    /// Returns an `IndexError` when the list is shorter than `position` or
    /// `position` is zero.
    pub fn index(&self, position: usize) -> Result<Thunk, Error> {
        if position == 0 {
            return Err(Error::index_error("list indices start at 1"));
        }
        match self.iter().nth(position - 1) {
            Some(element) => element,
            None => Err(Error::index_error(format!(
                "index {position} is out of range"
            ))),
        }
    }

    /// Whether an element equals `value`. Elements are forced in order until
    /// one matches.
    ///
    /// # Errors
    ///
    /// Returns the first error met while forcing or comparing elements.
    pub fn contains(&self, value: &Value) -> Result<bool, Error> {
        for element in self.iter() {
            if equal(&element?.force(), value)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// The list without the element at a 1-based position. The part after the
    /// removed element is shared, not copied.
    ///
    /// # Errors
    ///
    /// Returns an `IndexError` when there is no such element.
    pub fn delete(&self, position: usize) -> Result<List, Error> {
        if position == 0 {
            return Err(Error::index_error("list indices start at 1"));
        }

        let mut prefix = Vec::new();
        let mut current = self.clone();
        loop {
            let Some((head, tail)) = current.uncons() else {
                return Err(Error::index_error(format!(
                    "index {position} is out of range"
                )));
            };
            if prefix.len() + 1 == position {
                let tail = tail.clone();
                return Ok(prefix
                    .into_iter()
                    .rev()
                    .fold(tail, |tail, head| Thunk::new(List::cons(head, tail)))
                    .force()
                    .into_list()?);
            }
            prefix.push(head.clone());
            current = tail.force().into_list()?;
        }
    }

    /// Compare two lists element by element, stopping at the first
    /// difference. A shorter list that is a prefix of the other orders
    /// first.
    pub(crate) fn compare_with(
        &self,
        other: &List,
        compare_values: impl Fn(&Value, &Value) -> Result<Ordering, Error>,
    ) -> Result<Ordering, Error> {
        let mut left = self.clone();
        let mut right = other.clone();
        loop {
            let (l_head, l_tail, r_head, r_tail) = match (left.uncons(), right.uncons()) {
                (None, None) => return Ok(Ordering::Equal),
                (None, Some(_)) => return Ok(Ordering::Less),
                (Some(_), None) => return Ok(Ordering::Greater),
                (Some((lh, lt)), Some((rh, rt))) => (lh.clone(), lt.clone(), rh.clone(), rt.clone()),
            };
            if !l_head.ptr_eq(&r_head) {
                match compare_values(&l_head.force(), &r_head.force())? {
                    Ordering::Equal => {}
                    unequal => return Ok(unequal),
                }
            }
            if l_tail.ptr_eq(&r_tail) {
                return Ok(Ordering::Equal);
            }
            left = l_tail.force().into_list()?;
            right = r_tail.force().into_list()?;
        }
    }
}

/// Iterator over the elements of a [`List`]; see [`List::iter`].
pub struct Iter {
    rest: Option<Thunk>,
}

impl Iterator for Iter {
    type Item = Result<Thunk, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest.take()?;
        match rest.force().into_list() {
            Ok(list) => {
                let (head, tail) = list.uncons()?;
                self.rest = Some(tail.clone());
                Some(Ok(head.clone()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Lazily concatenate a list with `tail`.
///
/// Nothing is forced until the result is. A `list` that does not evaluate to
/// a list turns the concatenation into a `TypeError` (or the error it
/// evaluated to).
pub fn append(list: Thunk, tail: Thunk) -> Thunk {
    Thunk::suspend(move || match list.force().into_list() {
        Ok(list) => match list.uncons() {
            None => tail,
            Some((head, rest)) => Thunk::new(List::cons(head.clone(), append(rest.clone(), tail))),
        },
        Err(e) => Thunk::new(e),
    })
}

/// Put `elements` in front of `list`, without forcing `list`.
pub fn prepend(elements: impl IntoIterator<Item = Thunk>, list: Thunk) -> Thunk {
    let elements: Vec<Thunk> = elements.into_iter().collect();
    elements
        .into_iter()
        .rev()
        .fold(list, |tail, head| Thunk::new(List::cons(head, tail)))
}
