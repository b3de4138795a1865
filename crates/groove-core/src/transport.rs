//! Transport state and tempo context for block processing

/// Tempo used when the host reports something unusable
pub const DEFAULT_BPM: f64 = 120.0;

/// Transport playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
}

/// Transport position and tempo, as reported by the host at block start
#[derive(Debug, Clone)]
pub struct Transport {
    pub state: TransportState,
    /// Position of the current block start in samples
    pub position_samples: u64,
    /// Sample rate for time conversion
    pub sample_rate: u32,
    /// Tempo in BPM
    pub bpm: f64,
}

impl Default for Transport {
    fn default() -> Self {
        Self {
            state: TransportState::Stopped,
            position_samples: 0,
            sample_rate: 44100,
            bpm: DEFAULT_BPM,
        }
    }
}

impl Transport {
    pub fn new(sample_rate: u32, bpm: f64) -> Self {
        Self {
            sample_rate,
            bpm,
            ..Default::default()
        }
    }

    pub fn play(&mut self) {
        self.state = TransportState::Playing;
    }

    pub fn stop(&mut self) {
        self.state = TransportState::Stopped;
        self.position_samples = 0;
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    /// Tempo safe for beat math: non-finite or non-positive BPM falls back to 120
    pub fn tempo(&self) -> f64 {
        if self.bpm.is_finite() && self.bpm > 0.0 {
            self.bpm
        } else {
            DEFAULT_BPM
        }
    }

    fn rate(&self) -> f64 {
        f64::from(self.sample_rate.max(1))
    }

    /// Position in seconds
    pub fn position_secs(&self) -> f64 {
        self.position_samples as f64 / self.rate()
    }

    /// Start of the current block in seconds
    pub fn block_start_secs(&self) -> f64 {
        self.position_secs()
    }

    /// Advance position by given samples
    pub fn advance(&mut self, samples: u64) {
        self.position_samples = self.position_samples.saturating_add(samples);
    }

    pub fn seconds_per_beat(&self) -> f64 {
        60.0 / self.tempo()
    }

    /// Samples per beat at current tempo
    pub fn samples_per_beat(&self) -> f64 {
        self.rate() * self.seconds_per_beat()
    }

    /// Current beat number (0-indexed)
    pub fn current_beat(&self) -> f64 {
        self.position_samples as f64 / self.samples_per_beat()
    }

    /// Offset of `timestamp` from the block start, in whole samples.
    /// Negative when the event lies before the block.
    pub fn sample_offset_of(&self, timestamp: f64) -> i64 {
        ((timestamp - self.block_start_secs()) * self.rate()).floor() as i64
    }

    /// Absolute timestamp of a sample offset inside the current block
    pub fn timestamp_of(&self, sample_offset: u32) -> f64 {
        (self.position_samples + u64::from(sample_offset)) as f64 / self.rate()
    }
}
