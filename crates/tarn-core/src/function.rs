//! Functions and the application protocol.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::value::next_identity;
use crate::{Arguments, Effect, Error, Signature, Thunk, Value};

/// Implementation receiving unforced argument thunks.
pub type LazyBody = dyn Fn(&[Thunk]) -> Thunk + Send + Sync;

/// Implementation receiving forced argument values.
pub type StrictBody = dyn Fn(&[Value]) -> Thunk + Send + Sync;

/// A function value.
///
/// Functions compare by identity. Cloning shares the same function.
#[derive(Clone)]
pub struct Function(Arc<FunctionInner>);

struct FunctionInner {
    id: u64,
    name: Arc<str>,
    signature: Signature,
    body: Body,
    effectful: bool,
}

enum Body {
    Lazy(Box<LazyBody>),
    Strict(Box<StrictBody>),
    Partial {
        target: Function,
        arguments: Arguments,
    },
}

impl Function {
    /// A function whose implementation receives its parameters unevaluated.
    pub fn lazy(
        name: impl Into<Arc<str>>,
        signature: Signature,
        body: impl Fn(&[Thunk]) -> Thunk + Send + Sync + 'static,
    ) -> Self {
        Self::with_body(name.into(), signature, Body::Lazy(Box::new(body)), false)
    }

    /// A function whose parameters are all forced before the implementation
    /// runs. An error in any parameter is returned without calling it.
    pub fn strict(
        name: impl Into<Arc<str>>,
        signature: Signature,
        body: impl Fn(&[Value]) -> Thunk + Send + Sync + 'static,
    ) -> Self {
        Self::with_body(name.into(), signature, Body::Strict(Box::new(body)), false)
    }

    /// A function whose application yields an [`Effect`] wrapping the
    /// unevaluated call. The implementation runs only when the effect is
    /// forced impurely.
    pub fn effectful(
        name: impl Into<Arc<str>>,
        signature: Signature,
        body: impl Fn(&[Thunk]) -> Thunk + Send + Sync + 'static,
    ) -> Self {
        Self::with_body(name.into(), signature, Body::Lazy(Box::new(body)), true)
    }

    fn with_body(name: Arc<str>, signature: Signature, body: Body, effectful: bool) -> Self {
        Self(Arc::new(FunctionInner {
            id: next_identity(),
            name,
            signature,
            body,
            effectful,
        }))
    }

    /// This function with `arguments` fixed in front of the arguments of
    /// every later call.
    #[must_use]
    pub fn partial(&self, arguments: Arguments) -> Function {
        let name: Arc<str> = Arc::from(format!("{} (partial)", self.name()));
        Self::with_body(
            name,
            Signature::new(),
            Body::Partial {
                target: self.clone(),
                arguments,
            },
            false,
        )
    }

    /// The display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// The signature.
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.0.signature
    }

    /// Process-unique identity used for equality and ordering.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Whether applications of this function produce effects.
    #[must_use]
    pub fn is_effectful(&self) -> bool {
        self.0.effectful
    }

    /// Bind `arguments` and run the implementation.
    ///
    /// The returned thunk may be unevaluated; forcing it continues the call.
    pub fn call(&self, arguments: Arguments) -> Thunk {
        if let Body::Partial { target, arguments: fixed } = &self.0.body {
            return target.call(fixed.merge(&arguments));
        }

        let bound = match self.0.signature.bind(arguments) {
            Ok(bound) => bound,
            Err(e) => {
                debug!(function = %self.0.name, error = %e, "argument binding failed");
                return Thunk::new(e);
            }
        };

        if self.0.effectful {
            let function = self.clone();
            return Thunk::new(Effect::new(Thunk::suspend(move || function.invoke(&bound))));
        }
        self.invoke(&bound)
    }

    fn invoke(&self, bound: &[Thunk]) -> Thunk {
        match &self.0.body {
            Body::Lazy(body) => body(bound),
            Body::Strict(body) => {
                let mut values = Vec::with_capacity(bound.len());
                for thunk in bound {
                    match thunk.force() {
                        Value::Error(e) => return Thunk::new(e),
                        value => values.push(value),
                    }
                }
                body(&values)
            }
            Body::Partial { .. } => unreachable!("partial applications are resolved in `call`"),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.0.name)
    }
}

/// Apply whatever `function` evaluates to.
///
/// An error is passed on, a dictionary applied to one key indexes into
/// itself, and any other non-function is a `TypeError`.
pub(crate) fn apply(function: &Thunk, arguments: Arguments) -> Thunk {
    match function.force() {
        Value::Function(f) => f.call(arguments),
        Value::Dictionary(dictionary) => {
            let key = Signature::with_positionals(["key"])
                .bind(arguments)
                .and_then(|mut bound| bound.remove(0).force().check())
                .and_then(|key| dictionary.index(&key));
            match key {
                Ok(value) => value,
                Err(e) => Thunk::new(e),
            }
        }
        Value::Error(e) => Thunk::new(e),
        other => Thunk::new(Error::type_error(format!(
            "a {} cannot be applied",
            other.kind()
        ))),
    }
}
