//! Thunks: shared, memoized, thread-safe suspended computations.
//!
//! A thunk is forced at most once. The first thread to force it claims it and
//! computes; every other thread forcing it in the meantime blocks on the
//! thunk's condition variable and reuses the published value.
//!
//! Forcing runs as a loop rather than a recursion: when a function returns
//! another unevaluated application, the forcing thread claims that thunk too
//! and keeps going. Every claimed thunk receives the final value, so tail
//! calls neither grow the native stack nor repeat work.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};
use tarn_span::Location;
use tracing::{trace, warn};

use crate::function;
use crate::{Arguments, Error, Value};

/// A shared suspended computation.
///
/// Cloning a thunk is cheap and shares its memoization slot.
#[derive(Clone)]
pub struct Thunk(Arc<Slot>);

struct Slot {
    state: Mutex<State>,
    ready: Condvar,
}

enum State {
    Unevaluated(Pending),
    Evaluating(ThreadId),
    Evaluated(Value),
}

enum Pending {
    Application {
        function: Thunk,
        arguments: Arguments,
        site: Option<Location>,
    },
    Native(Box<dyn FnOnce() -> Thunk + Send>),
}

impl Pending {
    fn site(&self) -> Option<Location> {
        match self {
            Self::Application { site, .. } => site.clone(),
            Self::Native(_) => None,
        }
    }

    fn run(self) -> Thunk {
        match self {
            Self::Application {
                function,
                arguments,
                ..
            } => function::apply(&function, arguments),
            Self::Native(compute) => compute(),
        }
    }
}

enum Claim {
    Ready(Value),
    Owned(Pending),
    Cycle,
}

impl Thunk {
    /// A thunk holding an already-known value.
    pub fn new(value: impl Into<Value>) -> Self {
        Self::with_state(State::Evaluated(value.into()))
    }

    /// A pending application of `function` to `arguments`.
    ///
    /// The Rust call site is recorded and added to the call trace of an
    /// error the application produces.
    #[track_caller]
    pub fn app(function: impl Into<Thunk>, arguments: Arguments) -> Self {
        Self::with_state(State::Unevaluated(Pending::Application {
            function: function.into(),
            arguments,
            site: Some(Location::caller()),
        }))
    }

    /// A pending application written at `location` in a source program.
    pub fn app_at(function: impl Into<Thunk>, arguments: Arguments, location: Location) -> Self {
        Self::with_state(State::Unevaluated(Pending::Application {
            function: function.into(),
            arguments,
            site: Some(location),
        }))
    }

    /// A pending application that records no call site.
    pub fn app_untraced(function: impl Into<Thunk>, arguments: Arguments) -> Self {
        Self::with_state(State::Unevaluated(Pending::Application {
            function: function.into(),
            arguments,
            site: None,
        }))
    }

    /// A thunk computed by a one-shot native closure.
    ///
    /// The closure may return another unevaluated thunk; forcing continues
    /// into it.
    pub fn suspend(compute: impl FnOnce() -> Thunk + Send + 'static) -> Self {
        Self::with_state(State::Unevaluated(Pending::Native(Box::new(compute))))
    }

    fn with_state(state: State) -> Self {
        Self(Arc::new(Slot {
            state: Mutex::new(state),
            ready: Condvar::new(),
        }))
    }

    /// Returns true if both thunks share one memoization slot.
    #[must_use]
    pub fn ptr_eq(&self, other: &Thunk) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Returns true if this thunk has been forced to a value.
    #[must_use]
    pub fn is_evaluated(&self) -> bool {
        matches!(*self.0.state.lock(), State::Evaluated(_))
    }

    /// Evaluate to weak head normal form through the pure path.
    ///
    /// An effect is never returned: forcing one purely yields an
    /// `ImpureFunctionError`.
    pub fn force(&self) -> Value {
        match self.evaluate() {
            Value::Effect(_) => Error::impure_function_error(
                "an effect was evaluated in a pure context",
            )
            .into(),
            value => value,
        }
    }

    /// Evaluate an effect and run its payload.
    ///
    /// This is the only way to unwrap an [`Effect`](crate::Effect). An error
    /// passes through unchanged and any other kind is a `TypeError`.
    pub fn force_impure(&self) -> Value {
        match self.evaluate() {
            Value::Effect(effect) => effect.payload().force(),
            Value::Error(e) => Value::Error(e),
            other => Error::type_error(format!(
                "expected an effect but found a {}",
                other.kind()
            ))
            .into(),
        }
    }

    fn evaluate(&self) -> Value {
        let pending = match self.claim() {
            Claim::Ready(value) => return value,
            Claim::Cycle => return Error::infinite_loop_error().into(),
            Claim::Owned(pending) => pending,
        };

        let mut chain = vec![(self.clone(), pending.site())];
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| drive(pending, &mut chain)));
        let mut value = outcome.unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            warn!(%message, "native computation panicked");
            Error::internal_error(message).into()
        });

        if chain.len() > 1 {
            trace!(claimed = chain.len(), "forced a tail-call chain");
        }

        for (thunk, site) in chain.iter().rev() {
            if let (Value::Error(e), Some(site)) = (&value, site) {
                value = Value::Error(e.prepend(site.clone()));
            }
            thunk.publish(value.clone());
        }

        value
    }

    fn claim(&self) -> Claim {
        let current = thread::current().id();
        let mut state = self.0.state.lock();

        loop {
            match &*state {
                State::Evaluated(value) => return Claim::Ready(value.clone()),
                State::Evaluating(owner) if *owner == current => return Claim::Cycle,
                State::Evaluating(_) => {}
                State::Unevaluated(_) => break,
            }
            self.0.ready.wait(&mut state);
        }

        match std::mem::replace(&mut *state, State::Evaluating(current)) {
            State::Unevaluated(pending) => Claim::Owned(pending),
            State::Evaluating(_) | State::Evaluated(_) => unreachable!("thunk claimed twice"),
        }
    }

    fn publish(&self, value: Value) {
        let mut state = self.0.state.lock();
        debug_assert!(matches!(*state, State::Evaluating(_)));
        *state = State::Evaluated(value);
        self.0.ready.notify_all();
    }
}

/// Run a claimed computation, claiming the unevaluated thunks it returns.
fn drive(mut pending: Pending, chain: &mut Vec<(Thunk, Option<Location>)>) -> Value {
    loop {
        let next = pending.run();
        match next.claim() {
            Claim::Ready(value) => return value,
            Claim::Cycle => return Error::infinite_loop_error().into(),
            Claim::Owned(claimed) => {
                chain.push((next, claimed.site()));
                pending = claimed;
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "native computation panicked".to_string()
    }
}

impl<T: Into<Value>> From<T> for Thunk {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.state.try_lock().as_deref() {
            Some(State::Evaluated(value)) => write!(f, "Thunk({value:?})"),
            Some(State::Unevaluated(_)) => write!(f, "Thunk(<unevaluated>)"),
            Some(State::Evaluating(_)) | None => write!(f, "Thunk(<evaluating>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, Function, Signature};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_new_is_evaluated() {
        let thunk = Thunk::new(42.0);
        assert!(thunk.is_evaluated());
        assert_eq!(thunk.force().into_number().unwrap(), 42.0);
    }

    #[test]
    fn test_suspend_runs_once() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let thunk = Thunk::suspend(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Thunk::new("done")
        });

        assert!(!thunk.is_evaluated());
        assert_eq!(&*thunk.force().into_string().unwrap(), "done");
        assert_eq!(&*thunk.force().into_string().unwrap(), "done");
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_claimed_chain_is_memoized() {
        let inner = Thunk::suspend(|| Thunk::new(1.0));
        let returned = inner.clone();
        let outer = Thunk::suspend(move || returned);

        assert_eq!(outer.force().into_number().unwrap(), 1.0);
        assert!(inner.is_evaluated());
    }

    #[test]
    fn test_self_dependency_is_infinite_loop() {
        let slot: Arc<Mutex<Option<Thunk>>> = Arc::new(Mutex::new(None));
        let inner = Arc::clone(&slot);
        let thunk = Thunk::suspend(move || {
            let this = inner.lock().clone();
            match this {
                Some(this) => Thunk::new(this.force()),
                None => Thunk::new(Value::Nil),
            }
        });
        *slot.lock() = Some(thunk.clone());

        let err = thunk.force().check().unwrap_err();
        assert!(err.is(ErrorKind::InfiniteLoopError));
    }

    #[test]
    fn test_panic_becomes_internal_error() {
        let thunk = Thunk::suspend(|| panic!("kaboom"));
        let err = thunk.force().check().unwrap_err();
        assert!(err.is(ErrorKind::InternalError));
        assert_eq!(err.message(), "kaboom");
        assert!(thunk.is_evaluated());
    }

    #[test]
    fn test_force_rejects_effect() {
        let thunk = Thunk::new(crate::Effect::new(Thunk::new(Value::Nil)));
        let err = thunk.force().check().unwrap_err();
        assert!(err.is(ErrorKind::ImpureFunctionError));
    }

    #[test]
    fn test_force_impure() {
        let effect = Thunk::new(crate::Effect::new(Thunk::new(7.0)));
        assert_eq!(effect.force_impure().into_number().unwrap(), 7.0);

        let err = Thunk::new(1.0).force_impure().check().unwrap_err();
        assert!(err.is(ErrorKind::TypeError));

        let passed = Thunk::new(Error::value_error("x")).force_impure();
        assert!(passed.check().unwrap_err().is(ErrorKind::ValueError));
    }

    #[test]
    fn test_app_records_call_trace() {
        let fail = Function::strict("fail", Signature::new(), |_| {
            Thunk::new(Error::value_error("nope"))
        });
        let thunk = Thunk::app(fail, Arguments::new());
        let err = thunk.force().check().unwrap_err();

        assert_eq!(err.call_trace().len(), 1);
        assert!(err.call_trace()[0].file().ends_with("thunk.rs"));
    }

    #[test]
    fn test_app_at_uses_source_location() {
        let fail = Function::strict("fail", Signature::new(), |_| {
            Thunk::new(Error::value_error("nope"))
        });
        let location = Location::new("main.tarn", 4, 2);
        let err = Thunk::app_at(fail, Arguments::new(), location.clone())
            .force()
            .check()
            .unwrap_err();

        assert_eq!(err.call_trace().front(), Some(&location));
    }

    #[test]
    fn test_debug() {
        assert_eq!(format!("{:?}", Thunk::new(true)), "Thunk(true)");
        assert_eq!(
            format!("{:?}", Thunk::suspend(|| Thunk::new(true))),
            "Thunk(<unevaluated>)"
        );
    }
}
