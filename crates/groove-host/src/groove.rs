//! Test-pattern source standing in for a DAW's MIDI input

use groove_core::{MidiEvent, MidiMessage};

const GM_DRUM_CHANNEL: u8 = 9;
/// Kick, hat, snare, hat
const PATTERN: [u8; 4] = [36, 42, 38, 42];
const MOD_WHEEL: u8 = 1;

/// Straight eighth notes with a note-off halfway to the next step, plus one
/// mod wheel change per bar
#[derive(Debug, Clone)]
pub struct GrooveGenerator {
    velocity: u8,
}

impl GrooveGenerator {
    /// Grid resolution in beats: even points start a step, odd points end it
    const GRID_BEATS: f64 = 0.25;
    const POINTS_PER_BAR: u64 = 16;

    pub fn new(velocity: u8) -> Self {
        Self { velocity: velocity.clamp(1, 127) }
    }

    /// Append every event with a timestamp in `[start, end)`, in time order.
    /// Stops early rather than growing `out` past its capacity.
    pub fn fill(&self, start: f64, end: f64, bpm: f64, out: &mut Vec<MidiEvent>) {
        let secs_per_point = Self::GRID_BEATS * 60.0 / bpm;
        // Same `point * secs_per_point` test on both sides of a block boundary,
        // so adjacent blocks never both claim or both skip a point
        let mut point = (start / secs_per_point).floor().max(0.0) as u64;
        while (point as f64) * secs_per_point < start {
            point += 1;
        }

        loop {
            let at = point as f64 * secs_per_point;
            if at >= end {
                break;
            }
            let step = point / 2;
            let note = PATTERN[(step % PATTERN.len() as u64) as usize];

            if point % Self::POINTS_PER_BAR == 0 {
                let bar = point / Self::POINTS_PER_BAR;
                let value = ((bar * 16) % 128) as u8;
                let cc = MidiMessage::ControlChange { channel: GM_DRUM_CHANNEL, controller: MOD_WHEEL, value };
                if !push(out, MidiEvent::new(at, cc)) {
                    return;
                }
            }

            let event = if point % 2 == 0 {
                MidiEvent::note_on(at, GM_DRUM_CHANNEL, note, self.velocity)
            } else {
                MidiEvent::note_off(at, GM_DRUM_CHANNEL, note, 0)
            };
            if !push(out, event) {
                return;
            }
            point += 1;
        }
    }
}

fn push(out: &mut Vec<MidiEvent>, event: MidiEvent) -> bool {
    if out.len() == out.capacity() {
        return false;
    }
    out.push(event);
    true
}
