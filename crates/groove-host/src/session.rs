//! Simulated real-time block clock

use std::thread;
use std::time::{Duration, Instant};

use groove_core::{MidiEvent, Transport};
use groove_services::{BlockProcessor, BlockReport, EngineConfig, MidiBuffer};

use crate::groove::GrooveGenerator;

const PATTERN_VELOCITY: u8 = 96;

/// What the block thread saw, reported once it finishes
#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
    pub blocks: u64,
    pub events_in: u64,
    pub events_out: u64,
    pub report: BlockReport,
    /// Note-ons whose velocity went up
    pub accented: u64,
    /// Note-ons whose timestamp moved
    pub shifted: u64,
    pub max_shift_secs: f64,
    /// Blocks that took longer than their own duration
    pub late_blocks: u64,
}

/// Run `blocks` blocks through the processor. With `paced`, each block waits
/// out its real duration so remote changes land mid-run.
pub fn run(processor: &mut BlockProcessor, config: &EngineConfig, blocks: u64, paced: bool) -> SessionSummary {
    let block_size = config.block_size.max(1);
    let mut transport = Transport::new(config.sample_rate, config.tempo_bpm);
    let block_duration = Duration::from_secs_f64(f64::from(block_size) / f64::from(config.sample_rate.max(1)));
    let generator = GrooveGenerator::new(PATTERN_VELOCITY);

    // Everything the loop touches is allocated here, up front
    let mut input: Vec<MidiEvent> = Vec::with_capacity(config.max_block_events);
    let mut output = MidiBuffer::with_capacity(config.max_block_events);
    let mut summary = SessionSummary::default();

    transport.play();
    let started = Instant::now();

    for block in 0..blocks {
        let block_started = Instant::now();
        let start = transport.block_start_secs();
        let end = transport.timestamp_of(block_size);

        input.clear();
        generator.fill(start, end, transport.tempo(), &mut input);

        let report = processor.process_block(&transport, &input, &mut output);
        summary.report.merge(&report);
        summary.events_in += input.len() as u64;
        summary.events_out += output.len() as u64;
        tally(&input, output.as_slice(), &mut summary);

        if block_started.elapsed() > block_duration {
            summary.late_blocks += 1;
        }
        transport.advance(u64::from(block_size));
        summary.blocks += 1;

        if paced {
            let due = block_duration * (block as u32 + 1);
            if let Some(wait) = due.checked_sub(started.elapsed()) {
                thread::sleep(wait);
            }
        }
    }

    summary
}

fn tally(input: &[MidiEvent], output: &[MidiEvent], summary: &mut SessionSummary) {
    for (before, after) in input.iter().zip(output) {
        if !before.is_sounding_note_on() {
            continue;
        }
        if after.velocity() > before.velocity() {
            summary.accented += 1;
        }
        let shift = (after.timestamp - before.timestamp).abs();
        if shift > 0.0 {
            summary.shifted += 1;
            summary.max_shift_secs = summary.max_shift_secs.max(shift);
        }
    }
}
