//! Style engine assembly
//!
//! `StyleEngine::build` splits the engine into its three owners: the
//! control-side [`EngineHandle`], the queue's [`ControlSender`] (usually
//! handed to the remote listener), and the [`BlockProcessor`] that moves to
//! the real-time thread.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use groove_core::{ParameterStore, RandomSource, StyleParameters};
use tracing::info;

use crate::config::EngineConfig;
use crate::processor::BlockProcessor;
use crate::queue::{message_channel, ControlSender};
use crate::state::{self, PersistedState};

pub struct StyleEngine {
    pub handle: EngineHandle,
    pub sender: ControlSender,
    pub processor: BlockProcessor,
}

impl StyleEngine {
    pub fn build(config: &EngineConfig) -> Self {
        Self::build_with_random(config, RandomSource::from_clock())
    }

    /// Build with a fixed humanization seed
    pub fn build_with_random(config: &EngineConfig, random: RandomSource) -> Self {
        let store = Arc::new(ParameterStore::new());
        store.set_remote_enabled(config.remote.enabled);
        store.set_remote_port(i64::from(config.remote.port));

        let (sender, receiver) = message_channel(config.queue_capacity);
        let seed = random.seed();
        let processor = BlockProcessor::new(store.clone(), receiver, random, config.drain_cap);
        let handle = EngineHandle {
            store,
            dropped: sender.dropped_counter(),
        };

        info!(
            queue_capacity = config.queue_capacity,
            drain_cap = config.drain_cap,
            seed,
            "Style engine built"
        );

        Self { handle, sender, processor }
    }
}

/// Control-side view of counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Messages refused by a full queue
    pub dropped_messages: u64,
    /// Messages the store refused when applying
    pub rejected_messages: u64,
}

/// Control-side access to a running engine. Cheap to clone.
#[derive(Clone)]
pub struct EngineHandle {
    store: Arc<ParameterStore>,
    dropped: Arc<AtomicU64>,
}

impl EngineHandle {
    /// Shared store, for UI-style direct field writes
    pub fn store(&self) -> Arc<ParameterStore> {
        self.store.clone()
    }

    pub fn style(&self) -> StyleParameters {
        self.store.read()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            dropped_messages: self.dropped.load(Ordering::Relaxed),
            rejected_messages: self.store.rejected_messages(),
        }
    }

    pub fn save_state(&self) -> state::Result<Vec<u8>> {
        PersistedState::capture(&self.store).to_bytes()
    }

    pub fn load_state(&self, bytes: &[u8]) -> state::Result<()> {
        PersistedState::from_bytes(bytes)?.restore(&self.store);
        Ok(())
    }

    pub fn save_state_to(&self, path: &Path) -> state::Result<()> {
        PersistedState::capture(&self.store).save(path)?;
        info!(path = %path.display(), "Engine state saved");
        Ok(())
    }

    pub fn load_state_from(&self, path: &Path) -> state::Result<()> {
        PersistedState::load(path)?.restore(&self.store);
        info!(path = %path.display(), "Engine state restored");
        Ok(())
    }
}
