//! Shared parameter store (lock-free reads from the block processor)
//!
//! Each field lives in its own atomic; reals are stored as `f32` bit patterns.
//! A read never sees a torn field, but fields written between two loads of
//! one `read()` may come from different updates. That is fine: a change only
//! has to take effect from the next block on.

use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicU64, Ordering};

use crate::control::{ControlMessage, ParameterAddress};
use crate::style::{
    self, ParamRange, StyleParameters, ACCENT_AMOUNT, DEFAULT_REMOTE_PORT, HUMANIZE_TIMING, HUMANIZE_VELOCITY,
    SWING_RATIO,
};

/// Result of applying one update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Rejected,
}

pub struct ParameterStore {
    swing_ratio: AtomicU32,
    accent_amount: AtomicU32,
    humanize_timing: AtomicU32,
    humanize_velocity: AtomicU32,
    remote_enabled: AtomicBool,
    remote_port: AtomicU16,
    rejected: AtomicU64,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::with_style(StyleParameters::default())
    }

    pub fn with_style(style: StyleParameters) -> Self {
        let style = style.clamped();
        Self {
            swing_ratio: AtomicU32::new(style.swing_ratio.to_bits()),
            accent_amount: AtomicU32::new(style.accent_amount.to_bits()),
            humanize_timing: AtomicU32::new(style.humanize_timing.to_bits()),
            humanize_velocity: AtomicU32::new(style.humanize_velocity.to_bits()),
            remote_enabled: AtomicBool::new(false),
            remote_port: AtomicU16::new(DEFAULT_REMOTE_PORT),
            rejected: AtomicU64::new(0),
        }
    }

    /// Snapshot for one block. Four relaxed loads, no allocation.
    pub fn read(&self) -> StyleParameters {
        StyleParameters {
            swing_ratio: load(&self.swing_ratio),
            accent_amount: load(&self.accent_amount),
            humanize_timing: load(&self.humanize_timing),
            humanize_velocity: load(&self.humanize_velocity),
        }
    }

    /// Apply a queued message. Mismatched value types are rejected and
    /// counted; out-of-range values are clamped.
    pub fn apply(&self, message: &ControlMessage) -> ApplyOutcome {
        let value = message.value;
        let outcome = match message.address {
            ParameterAddress::SwingRatio => value.as_real().map_or(ApplyOutcome::Rejected, |v| self.set_swing_ratio(v)),
            ParameterAddress::AccentAmount => {
                value.as_real().map_or(ApplyOutcome::Rejected, |v| self.set_accent_amount(v))
            }
            ParameterAddress::HumanizeTiming => {
                value.as_real().map_or(ApplyOutcome::Rejected, |v| self.set_humanize_timing(v))
            }
            ParameterAddress::HumanizeVelocity => {
                value.as_real().map_or(ApplyOutcome::Rejected, |v| self.set_humanize_velocity(v))
            }
            ParameterAddress::RemoteEnabled => value.as_bool().map_or(ApplyOutcome::Rejected, |v| {
                self.set_remote_enabled(v);
                ApplyOutcome::Applied
            }),
            ParameterAddress::RemotePort => value.as_int().map_or(ApplyOutcome::Rejected, |v| {
                self.set_remote_port(v);
                ApplyOutcome::Applied
            }),
        };

        if outcome == ApplyOutcome::Rejected {
            self.rejected.fetch_add(1, Ordering::Relaxed);
        }
        outcome
    }

    pub fn set_swing_ratio(&self, value: f32) -> ApplyOutcome {
        store_clamped(&self.swing_ratio, SWING_RATIO, value)
    }

    pub fn set_accent_amount(&self, value: f32) -> ApplyOutcome {
        store_clamped(&self.accent_amount, ACCENT_AMOUNT, value)
    }

    pub fn set_humanize_timing(&self, value: f32) -> ApplyOutcome {
        store_clamped(&self.humanize_timing, HUMANIZE_TIMING, value)
    }

    pub fn set_humanize_velocity(&self, value: f32) -> ApplyOutcome {
        store_clamped(&self.humanize_velocity, HUMANIZE_VELOCITY, value)
    }

    /// Write a whole style at once, field by field
    pub fn set_style(&self, style: StyleParameters) {
        let style = style.clamped();
        self.set_swing_ratio(style.swing_ratio);
        self.set_accent_amount(style.accent_amount);
        self.set_humanize_timing(style.humanize_timing);
        self.set_humanize_velocity(style.humanize_velocity);
    }

    pub fn remote_enabled(&self) -> bool {
        self.remote_enabled.load(Ordering::Relaxed)
    }

    pub fn set_remote_enabled(&self, enabled: bool) {
        self.remote_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn remote_port(&self) -> u16 {
        self.remote_port.load(Ordering::Relaxed)
    }

    /// Store a clamped port and return what was stored
    pub fn set_remote_port(&self, port: i64) -> u16 {
        let port = style::clamp_port(port);
        self.remote_port.store(port, Ordering::Relaxed);
        port
    }

    /// Messages refused by `apply` since startup
    pub fn rejected_messages(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

fn load(cell: &AtomicU32) -> f32 {
    f32::from_bits(cell.load(Ordering::Relaxed))
}

fn store_clamped(cell: &AtomicU32, range: ParamRange, value: f32) -> ApplyOutcome {
    match range.clamp(value) {
        Some(v) => {
            cell.store(v.to_bits(), Ordering::Relaxed);
            ApplyOutcome::Applied
        }
        None => ApplyOutcome::Rejected,
    }
}
