//! Style transformation pipeline
//!
//! Swing, accent and humanization as plain functions from one event to one
//! event. They run in that fixed order and only touch sounding note-ons.
//! Nothing here allocates, blocks, or reads shared state.

use crate::midi::{MidiEvent, MAX_DATA_BYTE};
use crate::random::RandomSource;
use crate::style::StyleParameters;

/// Beat fractions strictly inside this window count as the off-beat "and"
pub const OFF_BEAT_WINDOW: (f64, f64) = (0.4, 0.6);
/// Beat fractions below the first or above the second edge count as on the beat
pub const ON_BEAT_EDGES: (f64, f64) = (0.1, 0.9);
/// Swing delay per unit of ratio above 0.5, in beats
pub const SWING_SPAN_BEATS: f64 = 0.25;
/// Largest humanize timing offset, in seconds
pub const MAX_TIMING_JITTER_SECS: f64 = 0.005;
/// Largest humanize velocity offset
pub const MAX_VELOCITY_JITTER: u16 = 10;

/// Sounding note-ons never leave the pipeline silent
const MIN_NOTE_ON_VELOCITY: i32 = 1;

/// Fractional part of the beat position at `timestamp`
pub fn beat_fraction(timestamp: f64, bpm: f64) -> f64 {
    let beats = timestamp * bpm / 60.0;
    beats - beats.floor()
}

pub fn is_off_beat(fraction: f64) -> bool {
    fraction > OFF_BEAT_WINDOW.0 && fraction < OFF_BEAT_WINDOW.1
}

pub fn is_on_beat(fraction: f64) -> bool {
    fraction < ON_BEAT_EDGES.0 || fraction > ON_BEAT_EDGES.1
}

fn usable_tempo(bpm: f64) -> bool {
    bpm.is_finite() && bpm > 0.0
}

fn clamp_velocity(velocity: i32) -> u8 {
    // A note-on at velocity 0 reads as a note-off downstream, and its matching
    // note-off would then close nothing, so the floor is 1
    velocity.clamp(MIN_NOTE_ON_VELOCITY, i32::from(MAX_DATA_BYTE)) as u8
}

/// Delay (or pull forward) off-beat notes. Timing only.
pub fn swing(event: MidiEvent, style: &StyleParameters, bpm: f64) -> MidiEvent {
    if !event.is_sounding_note_on() || !usable_tempo(bpm) {
        return event;
    }
    if !is_off_beat(beat_fraction(event.timestamp, bpm)) {
        return event;
    }

    let delay_beats = (f64::from(style.swing_ratio) - 0.5) * SWING_SPAN_BEATS;
    if delay_beats == 0.0 {
        return event;
    }
    event.with_timestamp(event.timestamp + delay_beats * 60.0 / bpm)
}

/// Add the accent amount to notes on the beat. Velocity only.
pub fn accent(event: MidiEvent, style: &StyleParameters, bpm: f64) -> MidiEvent {
    if !event.is_sounding_note_on() || !usable_tempo(bpm) {
        return event;
    }
    let Some(velocity) = event.velocity() else {
        return event;
    };
    if !is_on_beat(beat_fraction(event.timestamp, bpm)) {
        return event;
    }

    // Whole velocity units; the fractional part of the amount is dropped
    let boost = style.accent_amount as i32;
    event.with_velocity(clamp_velocity(i32::from(velocity) + boost))
}

/// Jitter timing and velocity in proportion to the humanize amounts.
/// A zero amount draws nothing and changes nothing.
pub fn humanize(event: MidiEvent, style: &StyleParameters, random: &mut RandomSource) -> MidiEvent {
    if !event.is_sounding_note_on() {
        return event;
    }
    let mut out = event;

    if style.humanize_timing > 0.0 {
        let offset = random.next_unit_interval() * MAX_TIMING_JITTER_SECS * f64::from(style.humanize_timing);
        out.timestamp = (out.timestamp + offset).max(0.0);
    }

    if style.humanize_velocity > 0.0 {
        if let Some(velocity) = out.velocity() {
            let jitter = (random.next_bounded_int(MAX_VELOCITY_JITTER) as f32 * style.humanize_velocity) as i32;
            out = out.with_velocity(clamp_velocity(i32::from(velocity) + jitter));
        }
    }

    out
}

/// Run one event through swing, accent and humanization
pub fn transform(event: MidiEvent, style: &StyleParameters, bpm: f64, random: &mut RandomSource) -> MidiEvent {
    if !event.is_sounding_note_on() {
        return event;
    }
    let event = swing(event, style, bpm);
    let event = accent(event, style, bpm);
    humanize(event, style, random)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::MidiMessage;

    const BPM: f64 = 120.0;
    const SECS_PER_BEAT: f64 = 60.0 / BPM;

    fn style(swing: f32, accent: f32) -> StyleParameters {
        StyleParameters {
            swing_ratio: swing,
            accent_amount: accent,
            humanize_timing: 0.0,
            humanize_velocity: 0.0,
        }
    }

    fn note_at_fraction(beat: f64, fraction: f64, velocity: u8) -> MidiEvent {
        MidiEvent::note_on((beat + fraction) * SECS_PER_BEAT, 0, 60, velocity)
    }

    #[test]
    fn test_beat_fraction() {
        assert_eq!(beat_fraction(0.0, BPM), 0.0);
        assert_eq!(beat_fraction(0.25, BPM), 0.5);
        assert_eq!(beat_fraction(1.75, BPM), 0.5);
        assert!((beat_fraction(0.01, BPM) - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_swing_delays_off_beat() {
        let ev = note_at_fraction(0.0, 0.5, 90);
        let out = transform(ev, &style(0.75, 20.0), BPM, &mut RandomSource::with_seed(1));
        let delay_beats = (out.timestamp - ev.timestamp) / SECS_PER_BEAT;
        assert!((delay_beats - 0.0625).abs() < 1e-12);
        // Off the beat, so the accent leaves it alone
        assert_eq!(out.velocity(), Some(90));
    }

    #[test]
    fn test_swing_below_half_pulls_early() {
        let ev = note_at_fraction(2.0, 0.5, 90);
        let out = swing(ev, &style(0.25, 0.0), BPM);
        let delay_beats = (out.timestamp - ev.timestamp) / SECS_PER_BEAT;
        assert!((delay_beats + 0.0625).abs() < 1e-12);
    }

    #[test]
    fn test_straight_swing_never_moves_notes() {
        let s = style(0.5, 0.0);
        for i in 0..200 {
            let ev = MidiEvent::note_on(i as f64 * 0.0173, 0, 60, 80);
            assert_eq!(swing(ev, &s, BPM).timestamp, ev.timestamp);
        }
    }

    #[test]
    fn test_swing_ignores_on_beat_and_edges() {
        let s = style(1.0, 0.0);
        for fraction in [0.0, 0.25, 0.4, 0.6, 0.75] {
            let ev = note_at_fraction(1.0, fraction, 80);
            assert_eq!(swing(ev, &s, BPM), ev, "fraction {fraction}");
        }
    }

    #[test]
    fn test_accent_on_beat() {
        let ev = note_at_fraction(0.0, 0.02, 100);
        let out = transform(ev, &style(0.5, 20.0), BPM, &mut RandomSource::with_seed(1));
        assert_eq!(out.timestamp, ev.timestamp);
        assert_eq!(out.velocity(), Some(120));
    }

    #[test]
    fn test_accent_clamps_at_127() {
        let ev = note_at_fraction(0.0, 0.0, 115);
        let out = accent(ev, &style(0.5, 20.0), BPM);
        assert_eq!(out.velocity(), Some(127));
    }

    #[test]
    fn test_accent_late_edge_counts_as_on_beat() {
        let ev = note_at_fraction(3.0, 0.95, 64);
        assert_eq!(accent(ev, &style(0.5, 10.0), BPM).velocity(), Some(74));
    }

    #[test]
    fn test_accent_leaves_off_beat_velocity() {
        let s = style(0.5, 40.0);
        for fraction in [0.1, 0.2, 0.5, 0.8, 0.9] {
            let ev = note_at_fraction(0.0, fraction, 77);
            assert_eq!(accent(ev, &s, BPM).velocity(), Some(77), "fraction {fraction}");
        }
    }

    #[test]
    fn test_accent_truncates_fractional_amount() {
        let ev = note_at_fraction(0.0, 0.0, 50);
        assert_eq!(accent(ev, &style(0.5, 12.9), BPM).velocity(), Some(62));
    }

    #[test]
    fn test_zero_humanize_is_exact_noop() {
        let s = style(0.66, 17.0);
        for seed in [0, 1, 42, u64::MAX] {
            let mut rng = RandomSource::with_seed(seed);
            for i in 0..64 {
                let ev = MidiEvent::note_on(i as f64 * 0.0625, 0, 60, 1 + (i as u8 % 126));
                let expected = accent(swing(ev, &s, BPM), &s, BPM);
                assert_eq!(transform(ev, &s, BPM, &mut rng), expected);
            }
        }
    }

    #[test]
    fn test_humanize_stays_within_jitter_bounds() {
        let s = StyleParameters {
            swing_ratio: 0.5,
            accent_amount: 0.0,
            humanize_timing: 1.0,
            humanize_velocity: 1.0,
        };
        let mut rng = RandomSource::with_seed(2024);
        let mut moved = false;
        for _ in 0..1_000 {
            let ev = MidiEvent::note_on(10.3, 0, 60, 64);
            let out = humanize(ev, &s, &mut rng);
            assert!((out.timestamp - ev.timestamp).abs() <= MAX_TIMING_JITTER_SECS + 1e-12);
            let v = out.velocity().unwrap();
            assert!((54..=74).contains(&v));
            moved |= out != ev;
        }
        assert!(moved);
    }

    #[test]
    fn test_humanize_is_seed_reproducible() {
        let s = StyleParameters {
            humanize_timing: 0.5,
            humanize_velocity: 0.8,
            ..StyleParameters::neutral()
        };
        let run = |seed| {
            let mut rng = RandomSource::with_seed(seed);
            (0..32)
                .map(|i| humanize(MidiEvent::note_on(i as f64, 0, 60, 90), &s, &mut rng))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(5), run(5));
    }

    #[test]
    fn test_humanize_scales_with_amount() {
        let half = StyleParameters {
            humanize_velocity: 0.5,
            ..StyleParameters::neutral()
        };
        let mut rng = RandomSource::with_seed(77);
        for _ in 0..1_000 {
            let out = humanize(MidiEvent::note_on(0.0, 0, 60, 64), &half, &mut rng);
            assert!((59..=69).contains(&out.velocity().unwrap()));
        }
    }

    #[test]
    fn test_velocity_stays_in_range_for_any_style() {
        let mut rng = RandomSource::with_seed(3);
        let styles = [
            StyleParameters { swing_ratio: 1.0, accent_amount: 127.0, humanize_timing: 1.0, humanize_velocity: 1.0 },
            StyleParameters { swing_ratio: 0.0, accent_amount: 0.0, humanize_timing: 1.0, humanize_velocity: 1.0 },
        ];
        for s in &styles {
            for i in 0..2_000 {
                let velocity = 1 + (i % 127) as u8;
                let ev = MidiEvent::note_on(i as f64 * 0.01, (i % 16) as u8, (i % 128) as u8, velocity);
                let out = transform(ev, s, BPM, &mut rng);
                let v = out.velocity().unwrap();
                assert!((1..=127).contains(&v));
                assert_eq!(out.message.note(), ev.message.note());
                assert_eq!(out.message.channel(), ev.message.channel());
                assert!(out.timestamp >= 0.0);
            }
        }
    }

    #[test]
    fn test_non_note_on_events_pass_untouched() {
        let s = StyleParameters { swing_ratio: 0.9, accent_amount: 50.0, humanize_timing: 1.0, humanize_velocity: 1.0 };
        let mut rng = RandomSource::with_seed(11);
        let events = [
            MidiEvent::note_off(0.25, 0, 60, 64),
            MidiEvent::note_on(0.0, 0, 60, 0),
            MidiEvent::new(0.25, MidiMessage::ControlChange { channel: 2, controller: 64, value: 127 }),
            MidiEvent::new(0.5, MidiMessage::parse(&[0xE0, 0x00, 0x40]).unwrap()),
        ];
        for ev in events {
            let out = transform(ev, &s, BPM, &mut rng);
            assert_eq!(out, ev);
            assert_eq!(out.timestamp.to_bits(), ev.timestamp.to_bits());
            assert_eq!(out.message.to_bytes(), ev.message.to_bytes());
        }
    }

    #[test]
    fn test_bad_tempo_is_noop_for_beat_stages() {
        let ev = note_at_fraction(0.0, 0.5, 90);
        let s = style(1.0, 30.0);
        assert_eq!(swing(ev, &s, 0.0), ev);
        assert_eq!(accent(ev, &s, f64::NAN), ev);
    }
}
