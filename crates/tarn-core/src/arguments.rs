//! Call-site arguments.

use std::sync::Arc;

use crate::Thunk;

/// A positional argument, optionally spread from a list.
#[derive(Clone, Debug)]
pub struct PositionalArgument {
    value: Thunk,
    expanded: bool,
}

impl PositionalArgument {
    /// Create a positional argument. An `expanded` argument must evaluate to a
    /// list whose elements become separate arguments.
    pub fn new(value: impl Into<Thunk>, expanded: bool) -> Self {
        Self {
            value: value.into(),
            expanded,
        }
    }

    /// The argument value.
    #[must_use]
    pub fn value(&self) -> &Thunk {
        &self.value
    }

    /// Whether the value is spread into several arguments.
    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }
}

/// A keyword argument, or a dictionary spread into keyword arguments.
///
/// An empty name marks a spread.
#[derive(Clone, Debug)]
pub struct KeywordArgument {
    name: Arc<str>,
    value: Thunk,
}

impl KeywordArgument {
    /// A named keyword argument.
    pub fn new(name: impl Into<Arc<str>>, value: impl Into<Thunk>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// A dictionary whose string keys become keyword arguments.
    pub fn expanded(value: impl Into<Thunk>) -> Self {
        Self::new("", value)
    }

    /// The keyword name; empty for a spread.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    /// The argument value.
    #[must_use]
    pub fn value(&self) -> &Thunk {
        &self.value
    }

    /// Whether this argument spreads a dictionary.
    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.name.is_empty()
    }
}

/// The arguments of one application.
#[derive(Clone, Debug, Default)]
pub struct Arguments {
    positionals: Vec<PositionalArgument>,
    keywords: Vec<KeywordArgument>,
}

impl Arguments {
    /// No arguments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arguments from their parts.
    #[must_use]
    pub fn with_parts(
        positionals: Vec<PositionalArgument>,
        keywords: Vec<KeywordArgument>,
    ) -> Self {
        Self {
            positionals,
            keywords,
        }
    }

    /// Plain positional arguments, none of them spread.
    pub fn positional(values: impl IntoIterator<Item = Thunk>) -> Self {
        Self {
            positionals: values
                .into_iter()
                .map(|value| PositionalArgument::new(value, false))
                .collect(),
            keywords: Vec::new(),
        }
    }

    /// Add a positional argument.
    #[must_use]
    pub fn push(mut self, value: impl Into<Thunk>) -> Self {
        self.positionals.push(PositionalArgument::new(value, false));
        self
    }

    /// Add a list spread into positional arguments.
    #[must_use]
    pub fn spread(mut self, list: impl Into<Thunk>) -> Self {
        self.positionals.push(PositionalArgument::new(list, true));
        self
    }

    /// Add a keyword argument.
    #[must_use]
    pub fn keyword(mut self, name: impl Into<Arc<str>>, value: impl Into<Thunk>) -> Self {
        self.keywords.push(KeywordArgument::new(name, value));
        self
    }

    /// Add a dictionary spread into keyword arguments.
    #[must_use]
    pub fn spread_keywords(mut self, dictionary: impl Into<Thunk>) -> Self {
        self.keywords.push(KeywordArgument::expanded(dictionary));
        self
    }

    /// The positional arguments in call order.
    #[must_use]
    pub fn positionals(&self) -> &[PositionalArgument] {
        &self.positionals
    }

    /// The keyword arguments in call order.
    #[must_use]
    pub fn keywords(&self) -> &[KeywordArgument] {
        &self.keywords
    }

    /// Append `other` after these arguments: positionals and keywords are
    /// each concatenated.
    #[must_use]
    pub fn merge(&self, other: &Arguments) -> Arguments {
        let mut merged = self.clone();
        merged.positionals.extend(other.positionals.iter().cloned());
        merged.keywords.extend(other.keywords.iter().cloned());
        merged
    }

    pub(crate) fn into_parts(self) -> (Vec<PositionalArgument>, Vec<KeywordArgument>) {
        (self.positionals, self.keywords)
    }
}
