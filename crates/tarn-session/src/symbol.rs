//! Fresh symbol generation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of fresh, process-unique names for generated bindings.
pub trait SymbolGenerator: Send + Sync {
    /// Return a symbol that no earlier call on this generator returned.
    fn next_symbol(&self) -> String;
}

/// A [`SymbolGenerator`] backed by an atomic counter.
///
/// Symbols are the prefix followed by the decimal counter value: `$0`, `$1`,
/// and so on.
#[derive(Debug)]
pub struct AtomicSymbolGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl AtomicSymbolGenerator {
    /// Create a generator with the default `$` prefix.
    #[must_use]
    pub fn new() -> Self {
        Self::with_prefix("$")
    }

    /// Create a generator with a custom prefix.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }

    /// Restart the counter at zero. Only meant for tests.
    pub fn reset(&self) {
        self.counter.store(0, Ordering::SeqCst);
    }
}

impl Default for AtomicSymbolGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolGenerator for AtomicSymbolGenerator {
    fn next_symbol(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}{n}", self.prefix)
    }
}
