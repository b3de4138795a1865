//! Per-block processing on the real-time thread
//!
//! Each block drains a bounded number of control messages into the store,
//! takes one style snapshot, then runs every input event through the
//! pipeline with that snapshot. Nothing in `process_block` allocates, locks,
//! logs, or returns an error.

use std::sync::Arc;

use groove_core::pipeline;
use groove_core::{ApplyOutcome, MidiEvent, ParameterStore, RandomSource, Transport};

use crate::queue::ControlReceiver;

/// Messages applied per block before the rest wait for the next one
pub const DEFAULT_DRAIN_CAP: usize = 64;
/// Output slots reserved per block
pub const DEFAULT_MAX_BLOCK_EVENTS: usize = 512;

/// Fixed-capacity event buffer. Storage is reserved once and never grows.
#[derive(Debug, Clone)]
pub struct MidiBuffer {
    events: Vec<MidiEvent>,
    capacity: usize,
}

impl MidiBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an event; returns false instead of growing when full
    pub fn push(&mut self, event: MidiEvent) -> bool {
        if self.events.len() >= self.capacity {
            return false;
        }
        self.events.push(event);
        true
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_slice(&self) -> &[MidiEvent] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MidiEvent> {
        self.events.iter()
    }
}

impl<'a> IntoIterator for &'a MidiBuffer {
    type Item = &'a MidiEvent;
    type IntoIter = std::slice::Iter<'a, MidiEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// What happened during one block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockReport {
    /// Control messages written to the store
    pub applied: u32,
    /// Control messages the store refused
    pub rejected: u32,
    /// Note-ons run through the pipeline
    pub transformed: u32,
    /// Events forwarded untouched
    pub passed_through: u32,
    /// Events lost because the output buffer was full
    pub overflowed: u32,
}

impl BlockReport {
    pub fn merge(&mut self, other: &BlockReport) {
        self.applied += other.applied;
        self.rejected += other.rejected;
        self.transformed += other.transformed;
        self.passed_through += other.passed_through;
        self.overflowed += other.overflowed;
    }
}

pub struct BlockProcessor {
    store: Arc<ParameterStore>,
    receiver: ControlReceiver,
    random: RandomSource,
    drain_cap: usize,
}

impl BlockProcessor {
    pub fn new(store: Arc<ParameterStore>, receiver: ControlReceiver, random: RandomSource, drain_cap: usize) -> Self {
        Self {
            store,
            receiver,
            random,
            drain_cap,
        }
    }

    pub fn drain_cap(&self) -> usize {
        self.drain_cap
    }

    /// Restart the humanization sequence, e.g. when playback restarts.
    /// Call between blocks, never from inside one.
    pub fn reseed(&mut self, seed: u64) {
        self.random.reseed(seed);
    }

    pub fn seed(&self) -> u64 {
        self.random.seed()
    }

    /// Process one block. `output` is cleared first and receives exactly one
    /// event per input event, in input order, until it runs out of room.
    pub fn process_block(&mut self, transport: &Transport, input: &[MidiEvent], output: &mut MidiBuffer) -> BlockReport {
        let mut report = BlockReport::default();

        for message in self.receiver.drain_up_to(self.drain_cap) {
            match self.store.apply(&message) {
                ApplyOutcome::Applied => report.applied += 1,
                ApplyOutcome::Rejected => report.rejected += 1,
            }
        }

        let style = self.store.read();
        let bpm = transport.tempo();

        output.clear();
        for event in input {
            let event = event.sanitized();
            let out = if event.is_sounding_note_on() {
                report.transformed += 1;
                pipeline::transform(event, &style, bpm, &mut self.random)
            } else {
                report.passed_through += 1;
                event
            };
            if !output.push(out) {
                report.overflowed += 1;
            }
        }

        report
    }
}
