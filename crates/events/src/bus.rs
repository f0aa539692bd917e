//! Event publishing/subscription abstraction (mechanics only).
//!
//! The bus is a **distribution** mechanism: the lifecycle engine publishes a
//! fact, any number of subscribers receive a copy. It makes minimal
//! assumptions:
//!
//! - **Transport-agnostic**: in-memory channels here, a broker elsewhere.
//! - **Best-effort delivery**: publication must never block or fail a status
//!   transition; subscribers that need durability have to arrange it
//!   themselves (persistence is the order repository's job, not the bus's).
//! - **No ordering guarantees** across concurrent publishers.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// A subscription to an event stream.
///
/// Each subscription gets a copy of every event published after it was opened
/// (broadcast semantics). Subscriptions are designed for single-threaded
/// consumption; hand out one per consumer.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything currently queued without blocking.
    pub fn drain(&self) -> Vec<M> {
        let mut out = Vec::new();
        while let Ok(msg) = self.try_recv() {
            out.push(msg);
        }
        out
    }
}

/// Domain-agnostic event bus (pub/sub abstraction).
///
/// `publish()` may fail (bus full, transport gone); callers that treat events
/// as fire-and-forget are expected to log and move on rather than abort the
/// operation that produced the event.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
