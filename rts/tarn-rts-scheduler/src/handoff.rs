//! Bounded handoff from producer threads to a lazy list.
//!
//! A producer publishes values into a bounded channel. The consumer sees the
//! channel as an ordinary Tarn list whose cells block on the next message
//! when forced. A full channel blocks the producer until the list is read
//! further.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use tarn_core::{Error, List, Thunk};

enum Message {
    Item(Thunk),
    Failure(Error),
}

/// The sending side of a handoff channel.
///
/// Clones publish into the same list. The list ends when every clone has
/// been dropped.
#[derive(Clone)]
pub struct Publisher {
    sender: Sender<Message>,
    closed: Arc<AtomicBool>,
}

impl Publisher {
    /// Append an element to the list.
    ///
    /// Blocks while the channel is full. Returns false if the list has been
    /// dropped or has already ended in an error, in which case nothing will
    /// ever read the element.
    pub fn publish(&self, item: impl Into<Thunk>) -> bool {
        self.send(Message::Item(item.into()))
    }

    /// End the list with `error` in place of its remaining elements.
    pub fn fail(&self, error: Error) -> bool {
        self.send(Message::Failure(error))
    }

    /// Returns true once a send has found the list gone.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn send(&self, message: Message) -> bool {
        if self.sender.send(message).is_ok() {
            return true;
        }
        self.closed.store(true, Ordering::Release);
        false
    }
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("pending", &self.sender.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Create a handoff channel holding at most `capacity` unread elements.
///
/// Returns the publisher and a thunk of the list it feeds.
#[must_use]
pub fn channel(capacity: usize) -> (Publisher, Thunk) {
    let (sender, receiver) = crossbeam_channel::bounded(capacity);
    let publisher = Publisher {
        sender,
        closed: Arc::new(AtomicBool::new(false)),
    };
    (publisher, stream(receiver))
}

fn stream(receiver: Receiver<Message>) -> Thunk {
    Thunk::suspend(move || match receiver.recv() {
        Ok(Message::Item(item)) => Thunk::new(List::cons(item, stream(receiver))),
        Ok(Message::Failure(error)) => Thunk::new(error),
        // every publisher is gone
        Err(_) => Thunk::new(List::empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tarn_core::ErrorKind;

    fn drain(list: &Thunk) -> Result<Vec<f64>, Error> {
        list.force()
            .into_list()?
            .iter()
            .map(|t| t?.force().into_number())
            .collect()
    }

    #[test]
    fn test_list_follows_publications() {
        let (publisher, list) = channel(2);
        let producer = thread::spawn(move || {
            for n in 0..10 {
                assert!(publisher.publish(f64::from(n)));
            }
        });

        let expected: Vec<f64> = (0..10).map(f64::from).collect();
        assert_eq!(drain(&list).unwrap(), expected);
        producer.join().unwrap();
    }

    #[test]
    fn test_failure_ends_the_list() {
        let (publisher, list) = channel(4);
        publisher.publish(1.0);
        publisher.fail(Error::value_error("source failed"));
        drop(publisher);

        let error = drain(&list).unwrap_err();
        assert!(error.is(ErrorKind::ValueError));
    }

    #[test]
    fn test_clones_share_the_list() {
        let (publisher, list) = channel(4);
        let other = publisher.clone();
        publisher.publish(1.0);
        drop(publisher);
        other.publish(2.0);
        drop(other);

        assert_eq!(drain(&list).unwrap(), [1.0, 2.0]);
    }

    #[test]
    fn test_dropped_list_closes_publisher() {
        let (publisher, list) = channel(1);
        drop(list);
        assert!(!publisher.publish(1.0));
        assert!(publisher.is_closed());
    }

    #[test]
    fn test_list_is_memoized() {
        let (publisher, list) = channel(4);
        publisher.publish(1.0);
        drop(publisher);

        assert_eq!(drain(&list).unwrap(), [1.0]);
        assert_eq!(drain(&list).unwrap(), [1.0]);
    }
}
