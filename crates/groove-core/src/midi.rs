//! MIDI event model for the style pipeline
//!
//! Events carry an absolute timestamp in seconds. Channels are stored as the
//! 0-based wire nibble; [`MidiMessage::channel_number`] gives the familiar 1-16.

/// Highest value a MIDI data byte can hold
pub const MAX_DATA_BYTE: u8 = 127;

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const CONTROL_CHANGE: u8 = 0xB0;

/// A short (at most three byte) channel or system message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    /// Anything else, kept as raw bytes so it round-trips untouched
    Other { bytes: [u8; 3], len: u8 },
}

impl MidiMessage {
    /// Parse a raw short message. Returns `None` for empty input, a missing
    /// status byte, or anything longer than three bytes (sysex is not carried).
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let (&status, data) = bytes.split_first()?;
        if status & 0x80 == 0 || bytes.len() > 3 {
            return None;
        }

        let channel = status & 0x0F;
        match (status & 0xF0, data) {
            (NOTE_ON, &[note, velocity]) => Some(Self::NoteOn { channel, note, velocity }),
            (NOTE_OFF, &[note, velocity]) => Some(Self::NoteOff { channel, note, velocity }),
            (CONTROL_CHANGE, &[controller, value]) => Some(Self::ControlChange { channel, controller, value }),
            _ => {
                let mut raw = [0u8; 3];
                raw[..bytes.len()].copy_from_slice(bytes);
                Some(Self::Other { bytes: raw, len: bytes.len() as u8 })
            }
        }
    }

    /// Encode back to wire bytes; only the first `len` bytes are meaningful
    pub fn to_bytes(&self) -> ([u8; 3], usize) {
        match *self {
            Self::NoteOn { channel, note, velocity } => ([NOTE_ON | (channel & 0x0F), note, velocity], 3),
            Self::NoteOff { channel, note, velocity } => ([NOTE_OFF | (channel & 0x0F), note, velocity], 3),
            Self::ControlChange { channel, controller, value } => {
                ([CONTROL_CHANGE | (channel & 0x0F), controller, value], 3)
            }
            Self::Other { bytes, len } => (bytes, usize::from(len.min(3))),
        }
    }

    /// 0-based channel for channel voice messages
    pub fn channel(&self) -> Option<u8> {
        match *self {
            Self::NoteOn { channel, .. } | Self::NoteOff { channel, .. } | Self::ControlChange { channel, .. } => {
                Some(channel)
            }
            Self::Other { bytes, len } if len > 0 && (0x80..0xF0).contains(&bytes[0]) => Some(bytes[0] & 0x0F),
            Self::Other { .. } => None,
        }
    }

    /// Channel as shown to users (1-16)
    pub fn channel_number(&self) -> Option<u8> {
        self.channel().map(|c| c + 1)
    }

    pub fn note(&self) -> Option<u8> {
        match *self {
            Self::NoteOn { note, .. } | Self::NoteOff { note, .. } => Some(note),
            _ => None,
        }
    }

    pub fn velocity(&self) -> Option<u8> {
        match *self {
            Self::NoteOn { velocity, .. } | Self::NoteOff { velocity, .. } => Some(velocity),
            _ => None,
        }
    }
}

/// A MIDI message stamped with its position in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MidiEvent {
    pub timestamp: f64,
    pub message: MidiMessage,
}

impl MidiEvent {
    pub fn new(timestamp: f64, message: MidiMessage) -> Self {
        Self { timestamp, message }
    }

    /// Note-on on a 0-based channel
    pub fn note_on(timestamp: f64, channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(timestamp, MidiMessage::NoteOn { channel, note, velocity })
    }

    /// Note-off on a 0-based channel
    pub fn note_off(timestamp: f64, channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(timestamp, MidiMessage::NoteOff { channel, note, velocity })
    }

    /// True for note-ons that actually start a note. Velocity 0 is a note-off.
    pub fn is_sounding_note_on(&self) -> bool {
        matches!(self.message, MidiMessage::NoteOn { velocity, .. } if velocity > 0)
    }

    pub fn velocity(&self) -> Option<u8> {
        self.message.velocity()
    }

    pub fn with_timestamp(self, timestamp: f64) -> Self {
        Self { timestamp, ..self }
    }

    /// Replace the velocity of a note message; other messages are returned as-is
    pub fn with_velocity(self, velocity: u8) -> Self {
        let message = match self.message {
            MidiMessage::NoteOn { channel, note, .. } => MidiMessage::NoteOn { channel, note, velocity },
            MidiMessage::NoteOff { channel, note, .. } => MidiMessage::NoteOff { channel, note, velocity },
            other => other,
        };
        Self { message, ..self }
    }

    /// Clamp anything an upstream producer may have put out of range.
    /// Well-formed events come back bit-for-bit identical.
    pub fn sanitized(self) -> Self {
        let timestamp = if self.timestamp.is_finite() { self.timestamp.max(0.0) } else { 0.0 };
        let data = |b: u8| b.min(MAX_DATA_BYTE);
        let ch = |c: u8| c & 0x0F;

        let message = match self.message {
            MidiMessage::NoteOn { channel, note, velocity } => MidiMessage::NoteOn {
                channel: ch(channel),
                note: data(note),
                velocity: data(velocity),
            },
            MidiMessage::NoteOff { channel, note, velocity } => MidiMessage::NoteOff {
                channel: ch(channel),
                note: data(note),
                velocity: data(velocity),
            },
            MidiMessage::ControlChange { channel, controller, value } => MidiMessage::ControlChange {
                channel: ch(channel),
                controller: data(controller),
                value: data(value),
            },
            MidiMessage::Other { mut bytes, len } if len > 0 && (0x80..0xF0).contains(&bytes[0]) => {
                // Channel voice data bytes (aftertouch note, pitch bend) are 7-bit too
                for b in bytes.iter_mut().take(usize::from(len.min(3))).skip(1) {
                    *b = data(*b);
                }
                MidiMessage::Other { bytes, len }
            }
            other => other,
        };

        // Keep -0.0 and friends untouched when nothing needed fixing
        if message == self.message && timestamp == self.timestamp {
            return self;
        }
        Self { timestamp, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_channel_messages() {
        assert_eq!(
            MidiMessage::parse(&[0x93, 60, 100]),
            Some(MidiMessage::NoteOn { channel: 3, note: 60, velocity: 100 })
        );
        assert_eq!(
            MidiMessage::parse(&[0x80, 60, 0]),
            Some(MidiMessage::NoteOff { channel: 0, note: 60, velocity: 0 })
        );
        assert_eq!(
            MidiMessage::parse(&[0xBF, 7, 64]),
            Some(MidiMessage::ControlChange { channel: 15, controller: 7, value: 64 })
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(MidiMessage::parse(&[]), None);
        assert_eq!(MidiMessage::parse(&[0x40, 1, 2]), None);
        assert_eq!(MidiMessage::parse(&[0xF0, 1, 2, 3, 0xF7]), None);
    }

    #[test]
    fn test_zero_velocity_note_on_stays_on_the_wire() {
        let msg = MidiMessage::parse(&[0x90, 64, 0]).unwrap();
        assert_eq!(msg.to_bytes(), ([0x90, 64, 0], 3));
        assert!(!MidiEvent::new(0.0, msg).is_sounding_note_on());
    }

    #[test]
    fn test_other_messages_keep_raw_bytes() {
        // Pitch bend, program change, clock
        for raw in [&[0xE2, 0x00, 0x40][..], &[0xC5, 12][..], &[0xF8][..]] {
            let msg = MidiMessage::parse(raw).unwrap();
            let (bytes, len) = msg.to_bytes();
            assert_eq!(&bytes[..len], raw);
        }
    }

    #[test]
    fn test_channel_number_is_one_based() {
        let msg = MidiMessage::NoteOn { channel: 0, note: 60, velocity: 1 };
        assert_eq!(msg.channel_number(), Some(1));
        let bend = MidiMessage::parse(&[0xEF, 0, 64]).unwrap();
        assert_eq!(bend.channel_number(), Some(16));
        assert_eq!(MidiMessage::parse(&[0xF8]).unwrap().channel(), None);
    }

    #[test]
    fn test_sanitized_clamps_out_of_range() {
        let bad = MidiEvent::new(f64::NAN, MidiMessage::NoteOn { channel: 20, note: 200, velocity: 255 });
        let clean = bad.sanitized();
        assert_eq!(clean.timestamp, 0.0);
        assert_eq!(clean.message, MidiMessage::NoteOn { channel: 4, note: 127, velocity: 127 });

        let early = MidiEvent::note_off(-1.0, 0, 60, 0).sanitized();
        assert_eq!(early.timestamp, 0.0);
    }

    #[test]
    fn test_sanitized_clamps_raw_channel_voice_data() {
        let touch = MidiEvent::new(0.0, MidiMessage::parse(&[0xA0, 200, 250]).unwrap()).sanitized();
        assert_eq!(touch.message.to_bytes(), ([0xA0, 127, 127], 3));

        let program = MidiEvent::new(0.0, MidiMessage::parse(&[0xC1, 0x90]).unwrap()).sanitized();
        assert_eq!(program.message.to_bytes().0[..2], [0xC1, 127]);

        // System messages are not channel voice and pass untouched
        let spp = MidiEvent::new(0.0, MidiMessage::parse(&[0xF2, 0x80, 0x01]).unwrap());
        assert_eq!(spp.sanitized(), spp);
    }

    #[test]
    fn test_sanitized_leaves_valid_events_alone() {
        let ev = MidiEvent::note_on(1.25, 9, 36, 110);
        assert_eq!(ev.sanitized(), ev);
        let cc = MidiEvent::new(0.5, MidiMessage::ControlChange { channel: 1, controller: 64, value: 127 });
        assert_eq!(cc.sanitized(), cc);
    }

    #[test]
    fn test_with_velocity_ignores_non_notes() {
        let cc = MidiEvent::new(0.0, MidiMessage::ControlChange { channel: 0, controller: 1, value: 5 });
        assert_eq!(cc.with_velocity(99), cc);
        assert_eq!(MidiEvent::note_on(0.0, 0, 60, 10).with_velocity(99).velocity(), Some(99));
    }
}
