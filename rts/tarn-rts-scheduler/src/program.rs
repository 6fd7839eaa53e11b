//! Running the top-level effects of a program.

use std::sync::Arc;

use tarn_core::builtins::Prelude;
use tarn_core::{Error, Thunk, Value};
use tarn_session::SessionRef;
use tracing::{debug, instrument, trace};

use crate::{rally, DaemonError, DaemonScheduler};

/// Failures of a program run.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    /// A statement evaluated to an error; later statements did not run.
    #[error("statement {index} failed: {error}")]
    Statement {
        /// Position of the statement, from 0.
        index: usize,
        /// The error with its call trace.
        #[source]
        error: Error,
    },

    /// The daemon scheduler could not be started.
    #[error(transparent)]
    Daemon(#[from] DaemonError),
}

impl ProgramError {
    /// A multi-line report: the call trace, outermost first, then the
    /// error itself.
    #[must_use]
    pub fn report(&self) -> String {
        match self {
            Self::Statement { error, .. } => error.lines(),
            Self::Daemon(e) => e.to_string(),
        }
    }
}

/// The top-level statements of a program, in source order.
///
/// Each statement is expected to be an effect.
#[derive(Clone, Debug, Default)]
pub struct Program {
    statements: Vec<Thunk>,
}

impl Program {
    /// An empty program.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A program of the given statements.
    #[must_use]
    pub fn with_statements(statements: impl IntoIterator<Item = Thunk>) -> Self {
        Self {
            statements: statements.into_iter().collect(),
        }
    }

    /// Append a statement.
    pub fn push(&mut self, statement: Thunk) {
        self.statements.push(statement);
    }

    /// Number of statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Returns true for a program without statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Run every statement impurely, one after another, on this thread.
    ///
    /// Returns the value of each statement's effect.
    ///
    /// # Errors
    ///
    /// Stops at the first statement that evaluates to an error. A statement
    /// that is not an effect fails with a `TypeError`.
    #[instrument(level = "debug", skip(self), fields(statements = self.statements.len()))]
    pub fn run(&self) -> Result<Vec<Value>, ProgramError> {
        let mut values = Vec::with_capacity(self.statements.len());
        for (index, statement) in self.statements.iter().enumerate() {
            trace!(index, "running statement");
            match statement.force_impure() {
                Value::Error(error) => {
                    debug!(index, error = %error, "statement failed");
                    return Err(ProgramError::Statement { index, error });
                }
                value => values.push(value),
            }
        }
        Ok(values)
    }
}

/// Everything a program needs at run time: the session, a daemon scheduler
/// built from its options, and a prelude that includes `rally`.
pub struct Runtime {
    session: SessionRef,
    scheduler: Arc<DaemonScheduler>,
    prelude: Prelude,
}

impl Runtime {
    /// Set up a runtime. Its scheduler starts with the first program run.
    #[must_use]
    pub fn new(session: SessionRef) -> Self {
        let scheduler = Arc::new(DaemonScheduler::from_options(&session.options));
        let mut prelude = Prelude::new();
        rally::install(&mut prelude, &scheduler);
        Self {
            session,
            scheduler,
            prelude,
        }
    }

    /// The session.
    #[must_use]
    pub fn session(&self) -> &SessionRef {
        &self.session
    }

    /// The daemon scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &Arc<DaemonScheduler> {
        &self.scheduler
    }

    /// The functions free identifiers resolve to.
    #[must_use]
    pub fn prelude(&self) -> &Prelude {
        &self.prelude
    }

    /// A fresh symbol from the session's generator.
    #[must_use]
    pub fn gensym(&self) -> String {
        self.session.symbols().next_symbol()
    }

    /// Start the scheduler if needed, then run `program`.
    ///
    /// # Errors
    ///
    /// See [`Program::run`]; also fails if a queued daemon cannot be
    /// started.
    pub fn run(&self, program: &Program) -> Result<Vec<Value>, ProgramError> {
        match self.scheduler.start() {
            Ok(queued) => debug!(queued, "runtime started"),
            Err(DaemonError::AlreadyStarted) => {}
            Err(e) => return Err(e.into()),
        }
        program.run()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("options", &self.session.options)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}
