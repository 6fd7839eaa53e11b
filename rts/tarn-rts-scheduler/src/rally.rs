//! The `rally` primitive.
//!
//! `rally(sources...)` forces every source concurrently and lists their
//! values in the order they complete. The argument spine may itself be an
//! unbounded, daemon-fed list; it is walked by a daemon of its own, so the
//! merged list starts yielding before the spine ends. Every source is
//! started as soon as the spine makes it available.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tarn_core::builtins::Prelude;
use tarn_core::{Error, Function, Signature, Thunk, Value};
use tracing::{debug, trace};

use crate::handoff::{self, Publisher};
use crate::DaemonScheduler;

/// The `rally` function, running its workers on `scheduler`.
pub fn rally(scheduler: Arc<DaemonScheduler>) -> Function {
    Function::lazy(
        "rally",
        Signature::new().rest_positionals("sources"),
        move |args| {
            if !scheduler.is_started() {
                // the walker would sit in the queue with nobody to start it
                return Thunk::new(Error::internal_error(
                    "rally needs a started daemon scheduler",
                ));
            }
            let (publisher, merged) = handoff::channel(scheduler.config().handoff_capacity);
            let sources = args[0].clone();
            let walker = Arc::clone(&scheduler);
            match scheduler.spawn("rally", move || walk(&walker, sources, publisher)) {
                Ok(id) => {
                    debug!(daemon = %id, "rally started");
                    merged
                }
                Err(e) => Thunk::new(Error::internal_error(e.to_string())),
            }
        },
    )
}

/// Add `rally` to a prelude.
pub fn install(prelude: &mut Prelude, scheduler: &Arc<DaemonScheduler>) {
    prelude.insert(rally(Arc::clone(scheduler)));
}

/// Workers whose source has a value that the merged list has not taken yet.
///
/// Only counts workers blocked on a full merged list, so a slow source never
/// holds the walker back.
#[derive(Default)]
struct Backlog {
    waiting: Mutex<usize>,
    drained: Condvar,
}

impl Backlog {
    fn enter(&self) {
        *self.waiting.lock() += 1;
    }

    fn leave(&self) {
        *self.waiting.lock() -= 1;
        self.drained.notify_all();
    }

    fn wait_below(&self, limit: usize) {
        let mut waiting = self.waiting.lock();
        while *waiting >= limit {
            self.drained.wait(&mut waiting);
        }
    }
}

/// Start one worker per element of `sources`, as soon as each element is
/// available. Stops early once nobody reads the merged list.
///
/// Reading ahead of the spine pauses while `handoff_capacity` finished
/// sources are still waiting for the reader.
fn walk(scheduler: &DaemonScheduler, sources: Thunk, publisher: Publisher) {
    let capacity = scheduler.config().handoff_capacity.max(1);
    let backlog = Arc::new(Backlog::default());
    let mut spine = sources;
    let mut started = 0usize;
    loop {
        backlog.wait_below(capacity);
        if publisher.is_closed() {
            return;
        }
        let list = match spine.force().into_list() {
            Ok(list) => list,
            Err(e) => {
                publisher.fail(e);
                return;
            }
        };
        let Some((source, rest)) = list.uncons() else {
            trace!(sources = started, "rally spine exhausted");
            return;
        };

        let source = source.clone();
        let worker = publisher.clone();
        let waiting = Arc::clone(&backlog);
        let spawned = scheduler.spawn("rally-source", move || {
            let value = source.force();
            waiting.enter();
            match value {
                Value::Error(e) => worker.fail(e),
                _ => worker.publish(source),
            };
            waiting.leave();
        });
        if let Err(e) = spawned {
            publisher.fail(Error::internal_error(e.to_string()));
            return;
        }

        started += 1;
        spine = rest.clone();
    }
}
