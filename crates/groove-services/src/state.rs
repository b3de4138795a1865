//! Persisted engine state
//!
//! A flat JSON object of the style parameters plus the remote-control flag
//! and port. Restoring goes through the same clamping setters as live updates.

use std::fs;
use std::path::Path;

use groove_core::style::{self, DEFAULT_REMOTE_PORT};
use groove_core::{ParameterStore, StyleParameters};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("State encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("State file error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StateError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedState {
    pub swing_ratio: f32,
    pub accent_amount: f32,
    pub humanize_timing: f32,
    pub humanize_velocity: f32,
    pub remote_enabled: bool,
    /// Wider than `u16` so out-of-range ports clamp instead of failing to parse
    pub remote_port: i64,
}

impl Default for PersistedState {
    fn default() -> Self {
        let style = StyleParameters::default();
        Self {
            swing_ratio: style.swing_ratio,
            accent_amount: style.accent_amount,
            humanize_timing: style.humanize_timing,
            humanize_velocity: style.humanize_velocity,
            remote_enabled: false,
            remote_port: i64::from(DEFAULT_REMOTE_PORT),
        }
    }
}

impl PersistedState {
    pub fn capture(store: &ParameterStore) -> Self {
        let style = store.read();
        Self {
            swing_ratio: style.swing_ratio,
            accent_amount: style.accent_amount,
            humanize_timing: style.humanize_timing,
            humanize_velocity: style.humanize_velocity,
            remote_enabled: store.remote_enabled(),
            remote_port: i64::from(store.remote_port()),
        }
    }

    /// Write into the store, clamping exactly like live updates
    pub fn restore(&self, store: &ParameterStore) {
        store.set_style(self.style());
        store.set_remote_enabled(self.remote_enabled);
        store.set_remote_port(self.remote_port);
    }

    /// Same state with every value pulled into range
    pub fn clamped(&self) -> Self {
        let style = self.style().clamped();
        Self {
            swing_ratio: style.swing_ratio,
            accent_amount: style.accent_amount,
            humanize_timing: style.humanize_timing,
            humanize_velocity: style.humanize_velocity,
            remote_enabled: self.remote_enabled,
            remote_port: i64::from(style::clamp_port(self.remote_port)),
        }
    }

    fn style(&self) -> StyleParameters {
        StyleParameters {
            swing_ratio: self.swing_ratio,
            accent_amount: self.accent_amount,
            humanize_timing: self.humanize_timing,
            humanize_velocity: self.humanize_velocity,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_bytes(&fs::read(path)?)
    }
}
