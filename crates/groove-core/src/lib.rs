//! groove-core: Domain types and real-time building blocks for the groove style engine

mod control;
mod error;
pub mod midi;
mod params;
pub mod pipeline;
mod random;
pub mod style;
mod transport;

pub use control::{ControlMessage, ControlValue, ParameterAddress};
pub use error::{ControlError, Result};
pub use midi::{MidiEvent, MidiMessage};
pub use params::{ApplyOutcome, ParameterStore};
pub use random::{clock_seed, RandomSource};
pub use style::{ParamRange, StyleParameters};
pub use transport::{Transport, TransportState};
