//! Daemons, handoff channels and the impure program runner for Tarn.
//!
//! Pure evaluation lives in `tarn-core`; this crate holds everything that
//! runs on threads of its own:
//!
//! - **Daemons** - long-lived background tasks started by a
//!   [`DaemonScheduler`], each on its own named thread
//! - **Handoff** - a bounded channel whose receiving end is a lazy list
//!   (see [`handoff`])
//! - **Rally** - merges concurrently progressing sources into one list in
//!   completion order (see [`rally()`])
//! - **Programs** - top-level effects run in order by a [`Runtime`]
//!
//! # Daemon Lifecycle
//!
//! ```text
//!   spawn           start
//!     |               |
//!     v               v
//! +--------+    +---------+    +----------+
//! | Queued | -> | Running | -> | Finished |
//! +--------+    +---------+    +----------+
//! ```
//!
//! Daemons spawned after `start` skip the queue. There is no cancellation:
//! a daemon runs until its body returns or the process exits.
//!
//! # Example
//!
//! ```ignore
//! use tarn_rts_scheduler::{DaemonScheduler, DaemonConfig};
//!
//! let scheduler = DaemonScheduler::new(DaemonConfig::default());
//! let numbers = scheduler.feed("counter", |publisher| {
//!     for n in 0..10 {
//!         publisher.publish(f64::from(n));
//!     }
//! })?;
//! scheduler.start()?;
//! // `numbers` is a lazy list of 0..10
//! ```

#![warn(missing_docs)]

pub mod handoff;
mod program;
mod rally;

pub use handoff::Publisher;
pub use program::{Program, ProgramError, Runtime};
pub use rally::{install, rally};

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;

use parking_lot::Mutex;
use tarn_core::Thunk;
use tarn_session::Options;
use tracing::{debug, trace, warn};

// ============================================================================
// Daemon Identity
// ============================================================================

/// Unique identifier of a daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DaemonId(u64);

impl DaemonId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DaemonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "daemon-{}", self.0)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Failures of the daemon scheduler itself.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    /// `start` was called a second time.
    #[error("daemon scheduler is already started")]
    AlreadyStarted,

    /// The operating system refused to create a thread.
    #[error("failed to spawn daemon `{name}`: {source}")]
    Spawn {
        /// Name the daemon was submitted under.
        name: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

// ============================================================================
// Configuration and Stats
// ============================================================================

/// Configuration for a daemon scheduler.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Stack size of daemon threads.
    pub stack_size: usize,
    /// Capacity of the handoff channels behind feeds and rallies.
    pub handoff_capacity: usize,
}

impl DaemonConfig {
    /// The daemon settings of a session.
    #[must_use]
    pub fn from_options(options: &Options) -> Self {
        Self {
            stack_size: options.daemon_stack_size,
            handoff_capacity: options.handoff_capacity,
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self::from_options(&Options::default())
    }
}

/// Counters kept by a daemon scheduler.
#[derive(Debug, Clone, Default)]
pub struct DaemonStats {
    /// Daemons whose thread was started.
    pub started: u64,
    /// Daemons whose body returned.
    pub finished: u64,
    /// Daemons whose body panicked.
    pub panicked: u64,
}

// ============================================================================
// Daemon Scheduler
// ============================================================================

struct Daemon {
    id: DaemonId,
    name: String,
    body: Box<dyn FnOnce() + Send>,
}

enum State {
    Queued(Vec<Daemon>),
    Started,
}

/// Starts daemons, each on a thread of its own.
///
/// Daemons spawned before [`start`](Self::start) wait in a queue; the
/// scheduler can therefore be wired into builtins while a program is still
/// being assembled.
pub struct DaemonScheduler {
    config: DaemonConfig,
    state: Mutex<State>,
    stats: Arc<Mutex<DaemonStats>>,
}

impl DaemonScheduler {
    /// Create a scheduler that has not started yet.
    #[must_use]
    pub fn new(config: DaemonConfig) -> Self {
        Self {
            config,
            state: Mutex::new(State::Queued(Vec::new())),
            stats: Arc::new(Mutex::new(DaemonStats::default())),
        }
    }

    /// Create a scheduler from session options.
    #[must_use]
    pub fn from_options(options: &Options) -> Self {
        Self::new(DaemonConfig::from_options(options))
    }

    /// The shared, already started scheduler of this process.
    pub fn global() -> Arc<DaemonScheduler> {
        static GLOBAL: OnceLock<Arc<DaemonScheduler>> = OnceLock::new();
        let scheduler = GLOBAL.get_or_init(|| {
            let scheduler = Arc::new(DaemonScheduler::new(DaemonConfig::default()));
            if let Err(e) = scheduler.start() {
                warn!(error = %e, "failed to start the global daemon scheduler");
            }
            scheduler
        });
        Arc::clone(scheduler)
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    /// Returns true once [`start`](Self::start) has been called.
    #[must_use]
    pub fn is_started(&self) -> bool {
        matches!(*self.state.lock(), State::Started)
    }

    /// Get a snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> DaemonStats {
        self.stats.lock().clone()
    }

    /// Submit a daemon. It runs immediately if the scheduler is started and
    /// is queued otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`DaemonError::Spawn`] if the thread cannot be created.
    pub fn spawn<F>(&self, name: impl Into<String>, body: F) -> Result<DaemonId, DaemonError>
    where
        F: FnOnce() + Send + 'static,
    {
        let daemon = Daemon {
            id: DaemonId::next(),
            name: name.into(),
            body: Box::new(body),
        };

        let mut state = self.state.lock();
        match &mut *state {
            State::Queued(queue) => {
                let id = daemon.id;
                debug!(daemon = %id, name = %daemon.name, "daemon queued");
                queue.push(daemon);
                Ok(id)
            }
            State::Started => {
                drop(state);
                self.launch(daemon)
            }
        }
    }

    /// Start every queued daemon and run later ones immediately.
    ///
    /// Returns the number of daemons that were waiting.
    ///
    /// # Errors
    ///
    /// Returns [`DaemonError::AlreadyStarted`] on a second call, or the first
    /// spawn failure. Daemons queued after a failed one are dropped.
    pub fn start(&self) -> Result<usize, DaemonError> {
        let queued = match std::mem::replace(&mut *self.state.lock(), State::Started) {
            State::Queued(queue) => queue,
            State::Started => return Err(DaemonError::AlreadyStarted),
        };

        let count = queued.len();
        debug!(daemons = count, "daemon scheduler started");
        for daemon in queued {
            self.launch(daemon)?;
        }
        Ok(count)
    }

    /// Run `producer` as a daemon feeding a lazy list.
    ///
    /// The producer receives the [`Publisher`] of a fresh handoff channel;
    /// the returned list yields what it publishes and ends once the
    /// publisher and all its clones are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`DaemonError::Spawn`] if the thread cannot be created.
    pub fn feed<F>(&self, name: impl Into<String>, producer: F) -> Result<Thunk, DaemonError>
    where
        F: FnOnce(Publisher) + Send + 'static,
    {
        let (publisher, list) = handoff::channel(self.config.handoff_capacity);
        self.spawn(name, move || producer(publisher))?;
        Ok(list)
    }

    fn launch(&self, daemon: Daemon) -> Result<DaemonId, DaemonError> {
        let Daemon { id, name, body } = daemon;
        let stats = Arc::clone(&self.stats);
        let label = name.clone();

        thread::Builder::new()
            .name(format!("tarn-daemon-{}", id.0))
            .stack_size(self.config.stack_size)
            .spawn(move || {
                trace!(daemon = %id, name = %label, "daemon running");
                let outcome = panic::catch_unwind(AssertUnwindSafe(body));
                let mut stats = stats.lock();
                match outcome {
                    Ok(()) => {
                        stats.finished += 1;
                        trace!(daemon = %id, name = %label, "daemon finished");
                    }
                    Err(_) => {
                        stats.panicked += 1;
                        warn!(daemon = %id, name = %label, "daemon panicked");
                    }
                }
            })
            .map_err(|source| DaemonError::Spawn { name, source })?;

        self.stats.lock().started += 1;
        Ok(id)
    }
}

impl fmt::Debug for DaemonScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DaemonScheduler")
            .field("config", &self.config)
            .field("started", &self.is_started())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};

    fn wait_until(condition: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "timed out");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_daemons_wait_for_start() {
        let scheduler = DaemonScheduler::new(DaemonConfig::default());
        let runs = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let runs = Arc::clone(&runs);
            scheduler
                .spawn("count", move || {
                    runs.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }
        thread::sleep(Duration::from_millis(20));
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(!scheduler.is_started());

        assert_eq!(scheduler.start().unwrap(), 3);
        wait_until(|| runs.load(Ordering::SeqCst) == 3);
        wait_until(|| scheduler.stats().finished == 3);
        assert_eq!(scheduler.stats().started, 3);
    }

    #[test]
    fn test_spawn_after_start_runs_immediately() {
        let scheduler = DaemonScheduler::new(DaemonConfig::default());
        scheduler.start().unwrap();

        let (sender, receiver) = crossbeam_channel::bounded(1);
        scheduler
            .spawn("late", move || {
                let name = thread::current().name().map(str::to_owned);
                let _ = sender.send(name);
            })
            .unwrap();
        let name = receiver.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
        assert!(name.starts_with("tarn-daemon-"));
    }

    #[test]
    fn test_start_twice() {
        let scheduler = DaemonScheduler::new(DaemonConfig::default());
        scheduler.start().unwrap();
        assert!(matches!(scheduler.start(), Err(DaemonError::AlreadyStarted)));
    }

    #[test]
    fn test_panicking_daemon_is_counted() {
        let scheduler = DaemonScheduler::new(DaemonConfig::default());
        scheduler.start().unwrap();
        scheduler.spawn("boom", || panic!("daemon failure")).unwrap();
        wait_until(|| scheduler.stats().panicked == 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let scheduler = DaemonScheduler::new(DaemonConfig::default());
        let a = scheduler.spawn("a", || {}).unwrap();
        let b = scheduler.spawn("b", || {}).unwrap();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("daemon-"));
    }

    #[test]
    fn test_global_is_started() {
        let scheduler = DaemonScheduler::global();
        assert!(scheduler.is_started());
        assert!(Arc::ptr_eq(&scheduler, &DaemonScheduler::global()));
    }

    #[test]
    fn test_config_from_options() {
        let options = Options {
            handoff_capacity: 7,
            daemon_stack_size: 1 << 20,
            ..Options::default()
        };
        let config = DaemonConfig::from_options(&options);
        assert_eq!(config.handoff_capacity, 7);
        assert_eq!(config.stack_size, 1 << 20);
    }
}
