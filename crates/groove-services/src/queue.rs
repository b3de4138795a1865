//! Control message queue (control thread -> block processor)
//!
//! An `rtrb` single-producer/single-consumer ring buffer: wait-free push and
//! pop, storage allocated once up front, no locks. When full, the newest
//! message is refused and counted; queued messages are never touched.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use groove_core::ControlMessage;
use thiserror::Error;

/// Default number of queued messages
///
/// Remote senders push at UI rates (tens per second), and the processor drains
/// every block, so a full queue means the block clock has stalled.
pub const CONTROL_QUEUE_CAPACITY: usize = 1024;

/// Returned by [`ControlSender::enqueue`] when the queue is full
#[derive(Debug, Error)]
#[error("Control queue full, dropped {0:?}")]
pub struct QueueFull(pub ControlMessage);

/// Create a sender/receiver pair holding up to `capacity` messages
pub fn message_channel(capacity: usize) -> (ControlSender, ControlReceiver) {
    let (producer, consumer) = rtrb::RingBuffer::new(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    (
        ControlSender { producer, dropped },
        ControlReceiver { consumer },
    )
}

/// Producer side, owned by the control thread
pub struct ControlSender {
    producer: rtrb::Producer<ControlMessage>,
    dropped: Arc<AtomicU64>,
}

impl ControlSender {
    /// Queue a message without blocking. Fails closed when full.
    pub fn enqueue(&mut self, message: ControlMessage) -> Result<(), QueueFull> {
        self.producer.push(message).map_err(|err| {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            match err {
                rtrb::PushError::Full(message) => QueueFull(message),
            }
        })
    }

    /// Messages refused because the queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub(crate) fn dropped_counter(&self) -> Arc<AtomicU64> {
        self.dropped.clone()
    }

    pub fn free_slots(&self) -> usize {
        self.producer.slots()
    }

    /// True once the receiver has been dropped
    pub fn is_abandoned(&self) -> bool {
        self.producer.is_abandoned()
    }
}

/// Consumer side, owned by the block processor
pub struct ControlReceiver {
    consumer: rtrb::Consumer<ControlMessage>,
}

impl ControlReceiver {
    pub fn pending(&self) -> usize {
        self.consumer.slots()
    }

    /// Pop at most `max` messages in FIFO order. Lazy and allocation-free;
    /// whatever the iterator does not consume stays queued.
    pub fn drain_up_to(&mut self, max: usize) -> Drain<'_> {
        Drain {
            consumer: &mut self.consumer,
            remaining: max,
        }
    }
}

/// Iterator returned by [`ControlReceiver::drain_up_to`]
pub struct Drain<'a> {
    consumer: &'a mut rtrb::Consumer<ControlMessage>,
    remaining: usize,
}

impl Iterator for Drain<'_> {
    type Item = ControlMessage;

    fn next(&mut self) -> Option<ControlMessage> {
        if self.remaining == 0 {
            return None;
        }
        let message = self.consumer.pop().ok()?;
        self.remaining -= 1;
        Some(message)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining.min(self.consumer.slots())))
    }
}
