//! groove-services: Engine wiring, control queue, persistence and remote control

pub mod config;
pub mod engine;
pub mod osc;
pub mod processor;
pub mod queue;
pub mod remote;
pub mod state;

pub use config::{ConfigError, EngineConfig, RemoteConfig};
pub use engine::{EngineHandle, EngineStats, StyleEngine};
pub use osc::{OscArg, OscError, OscMessage};
pub use processor::{BlockProcessor, BlockReport, MidiBuffer};
pub use queue::{message_channel, ControlReceiver, ControlSender, QueueFull, CONTROL_QUEUE_CAPACITY};
pub use remote::{ListenerStats, RemoteControlListener, RemoteError};
pub use state::{PersistedState, StateError};
