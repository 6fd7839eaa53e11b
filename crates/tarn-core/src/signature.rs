//! Function signatures and argument binding.
//!
//! Binding turns call-site [`Arguments`] into one thunk per declared
//! parameter, in declaration order: required positionals, the rest
//! positional list, optionals, then the rest keyword dictionary. Binding is
//! as lazy as the signature allows. A spread list is only walked as far as
//! the required parameters need, and leftovers become a lazily concatenated
//! rest list.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use crate::list;
use crate::{Arguments, Dictionary, Error, List, Thunk, Value};

/// A lazily computed default from the parameters bound before it.
pub type DefaultFn = Arc<dyn Fn(&[Thunk]) -> Thunk + Send + Sync>;

/// Default value of an optional parameter.
#[derive(Clone)]
pub enum DefaultValue {
    /// A fixed thunk, shared by every call.
    Fixed(Thunk),
    /// Computed per call from the parameters bound before this one.
    Computed(DefaultFn),
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(thunk) => write!(f, "{thunk:?}"),
            Self::Computed(_) => write!(f, "<computed>"),
        }
    }
}

/// An optional parameter, filled from a keyword argument of the same name.
#[derive(Clone, Debug)]
pub struct OptionalParameter {
    name: Arc<str>,
    default: DefaultValue,
}

impl OptionalParameter {
    /// An optional parameter with a fixed default.
    pub fn new(name: impl Into<Arc<str>>, default: impl Into<Thunk>) -> Self {
        Self {
            name: name.into(),
            default: DefaultValue::Fixed(default.into()),
        }
    }

    /// An optional parameter whose default is computed from earlier
    /// parameters.
    pub fn computed(
        name: impl Into<Arc<str>>,
        default: impl Fn(&[Thunk]) -> Thunk + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            default: DefaultValue::Computed(Arc::new(default)),
        }
    }

    /// The parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn default_for(&self, bound: &[Thunk]) -> Thunk {
        match &self.default {
            DefaultValue::Fixed(thunk) => thunk.clone(),
            DefaultValue::Computed(compute) => {
                let compute = Arc::clone(compute);
                let before = bound.to_vec();
                Thunk::suspend(move || compute(&before))
            }
        }
    }
}

/// The parameters a function accepts.
#[derive(Clone, Debug, Default)]
pub struct Signature {
    positionals: Vec<Arc<str>>,
    rest_positionals: Option<Arc<str>>,
    optionals: Vec<OptionalParameter>,
    rest_keywords: Option<Arc<str>>,
}

impl Signature {
    /// A signature without parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A signature with the given required positional parameters.
    pub fn with_positionals<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        Self {
            positionals: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Collect extra positional arguments into a list parameter.
    #[must_use]
    pub fn rest_positionals(mut self, name: impl Into<Arc<str>>) -> Self {
        self.rest_positionals = Some(name.into());
        self
    }

    /// Add an optional parameter.
    #[must_use]
    pub fn optional(mut self, parameter: OptionalParameter) -> Self {
        self.optionals.push(parameter);
        self
    }

    /// Collect extra keyword arguments into a dictionary parameter.
    #[must_use]
    pub fn rest_keywords(mut self, name: impl Into<Arc<str>>) -> Self {
        self.rest_keywords = Some(name.into());
        self
    }

    /// Number of bound parameters a call produces.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.positionals.len()
            + usize::from(self.rest_positionals.is_some())
            + self.optionals.len()
            + usize::from(self.rest_keywords.is_some())
    }

    /// Bind call-site arguments to parameters.
    ///
    /// # Errors
    ///
    /// Returns an `ArityError` for missing or surplus arguments, a
    /// `TypeError` when a spread positional is not a list or a spread keyword
    /// argument is not a dictionary with string keys, and any error a spread
    /// value evaluates to.
    pub fn bind(&self, arguments: Arguments) -> Result<Vec<Thunk>, Error> {
        let (positionals, keywords) = arguments.into_parts();
        let mut bound = Vec::with_capacity(self.arity());

        let mut queue: VecDeque<Segment> = positionals
            .into_iter()
            .map(|argument| {
                let value = argument.value().clone();
                if argument.is_expanded() {
                    Segment::Spread(value)
                } else {
                    Segment::Single(value)
                }
            })
            .collect();

        for name in &self.positionals {
            match pull(&mut queue)? {
                Some(thunk) => bound.push(thunk),
                None => {
                    return Err(Error::arity_error(format!(
                        "missing positional argument `{name}`"
                    )))
                }
            }
        }

        if self.rest_positionals.is_some() {
            bound.push(rest_list(queue));
        } else if pull(&mut queue)?.is_some() {
            return Err(Error::arity_error("too many positional arguments"));
        }

        let mut named: BTreeMap<Arc<str>, Thunk> = BTreeMap::new();
        for keyword in keywords {
            if keyword.is_expanded() {
                let dictionary = keyword.value().force().into_dictionary()?;
                for (key, value) in dictionary.iter() {
                    match key {
                        Value::String(name) => {
                            named.insert(Arc::clone(name), value.clone());
                        }
                        other => {
                            return Err(Error::type_error(format!(
                                "keyword argument names must be strings, not a {}",
                                other.kind()
                            )))
                        }
                    }
                }
            } else {
                named.insert(Arc::clone(keyword.name_arc()), keyword.value().clone());
            }
        }

        for optional in &self.optionals {
            let thunk = match named.remove(&optional.name) {
                Some(thunk) => thunk,
                None => optional.default_for(&bound),
            };
            bound.push(thunk);
        }

        if self.rest_keywords.is_some() {
            let mut rest = Dictionary::new();
            for (name, value) in named {
                rest = rest.insert(Value::String(name), value)?;
            }
            bound.push(Thunk::new(rest));
        } else if let Some(name) = named.keys().next() {
            return Err(Error::arity_error(format!(
                "unexpected keyword argument `{name}`"
            )));
        }

        Ok(bound)
    }
}

enum Segment {
    Single(Thunk),
    Spread(Thunk),
}

/// Take the next positional value, walking into spread lists one cell at a
/// time.
fn pull(queue: &mut VecDeque<Segment>) -> Result<Option<Thunk>, Error> {
    while let Some(segment) = queue.pop_front() {
        match segment {
            Segment::Single(thunk) => return Ok(Some(thunk)),
            Segment::Spread(thunk) => {
                let list = match thunk.force() {
                    Value::List(list) => list,
                    other => {
                        return Err(match other {
                            Value::Error(e) => e,
                            other => Error::type_error(format!(
                                "cannot spread a {} into positional arguments",
                                other.kind()
                            )),
                        })
                    }
                };
                if let Some((head, tail)) = list.uncons() {
                    queue.push_front(Segment::Spread(tail.clone()));
                    return Ok(Some(head.clone()));
                }
            }
        }
    }
    Ok(None)
}

/// The remaining positional values as a lazy list.
fn rest_list(queue: VecDeque<Segment>) -> Thunk {
    queue
        .into_iter()
        .rev()
        .fold(Thunk::new(List::empty()), |tail, segment| match segment {
            Segment::Single(head) => Thunk::new(List::cons(head, tail)),
            Segment::Spread(list) => list::append(list, tail),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::equal;
    use crate::ErrorKind;

    fn numbers(ns: &[f64]) -> Thunk {
        Thunk::new(List::from_values(ns.iter().map(|&n| Value::Number(n))))
    }

    fn number(thunk: &Thunk) -> f64 {
        thunk.force().into_number().unwrap()
    }

    #[test]
    fn test_bind_required_and_rest_from_spread() {
        let signature = Signature::with_positionals(["x"]).rest_positionals("xs");
        let bound = signature
            .bind(Arguments::new().spread(numbers(&[1.0, 2.0, 3.0])))
            .unwrap();

        assert_eq!(bound.len(), 2);
        assert_eq!(number(&bound[0]), 1.0);
        assert!(equal(&bound[1].force(), &numbers(&[2.0, 3.0]).force()).unwrap());
    }

    #[test]
    fn test_bind_mixed_spreads_and_singles() {
        let signature = Signature::with_positionals(["a", "b", "c"]).rest_positionals("rest");
        let arguments = Arguments::new()
            .spread(numbers(&[]))
            .push(1.0)
            .spread(numbers(&[2.0]))
            .spread(numbers(&[3.0, 4.0]))
            .push(5.0);
        let bound = signature.bind(arguments).unwrap();

        assert_eq!(number(&bound[0]), 1.0);
        assert_eq!(number(&bound[1]), 2.0);
        assert_eq!(number(&bound[2]), 3.0);
        assert!(equal(&bound[3].force(), &numbers(&[4.0, 5.0]).force()).unwrap());
    }

    #[test]
    fn test_bind_missing_positional() {
        let err = Signature::with_positionals(["x", "y"])
            .bind(Arguments::positional([Thunk::new(1.0)]))
            .unwrap_err();
        assert!(err.is(ErrorKind::ArityError));
        assert!(err.message().contains("`y`"));
    }

    #[test]
    fn test_bind_too_many_positionals() {
        let err = Signature::with_positionals(["x"])
            .bind(Arguments::new().spread(numbers(&[1.0, 2.0])))
            .unwrap_err();
        assert!(err.is(ErrorKind::ArityError));
    }

    #[test]
    fn test_bind_spread_of_non_list() {
        let bound = Signature::new()
            .rest_positionals("xs")
            .bind(Arguments::new().spread(Value::Nil))
            .unwrap();
        let err = bound[0].force().check().unwrap_err();
        assert!(err.is(ErrorKind::TypeError));

        let err = Signature::with_positionals(["x"])
            .bind(Arguments::new().spread(true))
            .unwrap_err();
        assert!(err.is(ErrorKind::TypeError));
    }

    #[test]
    fn test_bind_rest_list_is_lazy() {
        let tail = Thunk::suspend(|| Thunk::new(List::empty()));
        let spread = Thunk::new(List::cons(Thunk::new(1.0), tail.clone()));
        let bound = Signature::with_positionals(["x"])
            .rest_positionals("xs")
            .bind(Arguments::new().spread(spread))
            .unwrap();

        assert_eq!(number(&bound[0]), 1.0);
        assert!(!tail.is_evaluated());
    }

    #[test]
    fn test_bind_optionals() {
        let signature = Signature::new()
            .optional(OptionalParameter::new("a", 1.0))
            .optional(OptionalParameter::new("b", 2.0));
        let bound = signature.bind(Arguments::new().keyword("b", 20.0)).unwrap();

        assert_eq!(number(&bound[0]), 1.0);
        assert_eq!(number(&bound[1]), 20.0);
    }

    #[test]
    fn test_bind_computed_default_sees_earlier_parameters() {
        let signature = Signature::with_positionals(["x"]).optional(OptionalParameter::computed(
            "y",
            |before: &[Thunk]| before[0].clone(),
        ));
        let bound = signature.bind(Arguments::positional([Thunk::new(9.0)])).unwrap();
        assert_eq!(number(&bound[1]), 9.0);
    }

    #[test]
    fn test_bind_expanded_keywords_last_wins() {
        let first = Dictionary::new()
            .insert(Value::from("a"), Thunk::new(1.0))
            .unwrap();
        let second = Dictionary::new()
            .insert(Value::from("a"), Thunk::new(2.0))
            .unwrap();
        let signature = Signature::new().optional(OptionalParameter::new("a", 0.0));

        let bound = signature
            .bind(
                Arguments::new()
                    .spread_keywords(first)
                    .keyword("a", 3.0)
                    .spread_keywords(second),
            )
            .unwrap();
        assert_eq!(number(&bound[0]), 2.0);
    }

    #[test]
    fn test_bind_rest_keywords() {
        let signature = Signature::new()
            .optional(OptionalParameter::new("a", 0.0))
            .rest_keywords("others");
        let bound = signature
            .bind(Arguments::new().keyword("a", 1.0).keyword("b", 2.0))
            .unwrap();

        let others = bound[1].force().into_dictionary().unwrap();
        assert_eq!(others.len(), 1);
        assert_eq!(number(&others.index(&Value::from("b")).unwrap()), 2.0);
    }

    #[test]
    fn test_bind_unexpected_keyword() {
        let err = Signature::new()
            .bind(Arguments::new().keyword("z", 1.0))
            .unwrap_err();
        assert!(err.is(ErrorKind::ArityError));
        assert!(err.message().contains("`z`"));
    }

    #[test]
    fn test_bind_expanded_keyword_errors() {
        let signature = Signature::new().rest_keywords("kw");

        let err = signature
            .bind(Arguments::new().spread_keywords(Error::value_error("dummy")))
            .unwrap_err();
        assert!(err.is(ErrorKind::ValueError));

        let numeric_keys = Dictionary::new().insert(Value::from(1.0), Thunk::new(1.0)).unwrap();
        let err = signature
            .bind(Arguments::new().spread_keywords(numeric_keys))
            .unwrap_err();
        assert!(err.is(ErrorKind::TypeError));
    }

    #[test]
    fn test_arity() {
        let signature = Signature::with_positionals(["a", "b"])
            .rest_positionals("c")
            .optional(OptionalParameter::new("d", Value::Nil))
            .rest_keywords("e");
        assert_eq!(signature.arity(), 5);
    }
}
