//! Effects: impure computations carried through pure code.

use std::fmt;
use std::sync::Arc;

use crate::value::next_identity;
use crate::Thunk;

/// A marker wrapping the payload of an impure computation.
///
/// Effects are built by pure code but can only be unwrapped by
/// [`Thunk::force_impure`]. Since the payload is a thunk, it runs at most
/// once however many times the effect is run.
#[derive(Clone)]
pub struct Effect(Arc<EffectInner>);

struct EffectInner {
    id: u64,
    payload: Thunk,
}

impl Effect {
    /// Wrap a payload.
    #[must_use]
    pub fn new(payload: Thunk) -> Self {
        Self(Arc::new(EffectInner {
            id: next_identity(),
            payload,
        }))
    }

    /// The payload thunk.
    #[must_use]
    pub fn payload(&self) -> &Thunk {
        &self.0.payload
    }

    /// Process-unique identity used for equality and ordering.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.0.id
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<effect #{}>", self.0.id)
    }
}
