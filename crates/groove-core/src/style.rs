//! Style parameters and their declared ranges

/// Declared range and default of a real-valued style parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl ParamRange {
    pub const fn new(min: f32, max: f32, default: f32) -> Self {
        Self { min, max, default }
    }

    /// Clamp into range. NaN has no nearest bound and yields `None`.
    pub fn clamp(&self, value: f32) -> Option<f32> {
        if value.is_nan() {
            None
        } else {
            Some(value.clamp(self.min, self.max))
        }
    }
}

/// 0.5 is straight time, above delays off-beats, below pulls them early
pub const SWING_RATIO: ParamRange = ParamRange::new(0.0, 1.0, 0.5);
/// Velocity units added on the beat. Anything past 127 saturates identically.
pub const ACCENT_AMOUNT: ParamRange = ParamRange::new(0.0, 127.0, 20.0);
pub const HUMANIZE_TIMING: ParamRange = ParamRange::new(0.0, 1.0, 0.0);
pub const HUMANIZE_VELOCITY: ParamRange = ParamRange::new(0.0, 1.0, 0.0);

pub const REMOTE_PORT_MIN: u16 = 1000;
pub const REMOTE_PORT_MAX: u16 = u16::MAX;
pub const DEFAULT_REMOTE_PORT: u16 = 3819;

/// Clamp a requested listening port into the allowed range
pub fn clamp_port(port: i64) -> u16 {
    port.clamp(i64::from(REMOTE_PORT_MIN), i64::from(REMOTE_PORT_MAX)) as u16
}

/// Immutable snapshot of the style configuration for one block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleParameters {
    pub swing_ratio: f32,
    pub accent_amount: f32,
    pub humanize_timing: f32,
    pub humanize_velocity: f32,
}

impl Default for StyleParameters {
    fn default() -> Self {
        Self {
            swing_ratio: SWING_RATIO.default,
            accent_amount: ACCENT_AMOUNT.default,
            humanize_timing: HUMANIZE_TIMING.default,
            humanize_velocity: HUMANIZE_VELOCITY.default,
        }
    }
}

impl StyleParameters {
    /// Straight time, no accent, no humanization
    pub fn neutral() -> Self {
        Self {
            swing_ratio: 0.5,
            accent_amount: 0.0,
            humanize_timing: 0.0,
            humanize_velocity: 0.0,
        }
    }

    /// Every field pulled into its range; NaN fields take the default
    pub fn clamped(self) -> Self {
        let fix = |range: ParamRange, v: f32| range.clamp(v).unwrap_or(range.default);
        Self {
            swing_ratio: fix(SWING_RATIO, self.swing_ratio),
            accent_amount: fix(ACCENT_AMOUNT, self.accent_amount),
            humanize_timing: fix(HUMANIZE_TIMING, self.humanize_timing),
            humanize_velocity: fix(HUMANIZE_VELOCITY, self.humanize_velocity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_clamp() {
        assert_eq!(ACCENT_AMOUNT.clamp(-5.0), Some(0.0));
        assert_eq!(ACCENT_AMOUNT.clamp(500.0), Some(127.0));
        assert_eq!(SWING_RATIO.clamp(f32::INFINITY), Some(1.0));
        assert_eq!(SWING_RATIO.clamp(0.7), Some(0.7));
        assert_eq!(SWING_RATIO.clamp(f32::NAN), None);
    }

    #[test]
    fn test_port_clamp() {
        assert_eq!(clamp_port(80), REMOTE_PORT_MIN);
        assert_eq!(clamp_port(70000), REMOTE_PORT_MAX);
        assert_eq!(clamp_port(9000), 9000);
    }

    #[test]
    fn test_clamped_snapshot() {
        let wild = StyleParameters {
            swing_ratio: 2.0,
            accent_amount: f32::NAN,
            humanize_timing: -1.0,
            humanize_velocity: 0.25,
        };
        let tame = wild.clamped();
        assert_eq!(tame.swing_ratio, 1.0);
        assert_eq!(tame.accent_amount, ACCENT_AMOUNT.default);
        assert_eq!(tame.humanize_timing, 0.0);
        assert_eq!(tame.humanize_velocity, 0.25);
    }
}
