//! Persistence contract (§10.6): the write interface between a [`Run`]'s
//! state and whatever store keeps it across restarts. The store itself
//! (file, object storage, database) is out of scope — this crate only
//! defines the shape the two sides agree on and one in-memory reference
//! implementation for tests and small embedders.
//!
//! [`checkpoint`] snapshots and saves in two separate lock acquisitions;
//! it is not the atomic write-back the run's concurrency model calls for
//! (§5: persistence must commit under the same write lock as the report
//! that produced it). An embedder wiring a real backend in needs its own
//! [`Run::report`] wrapper that holds the write lock across both the
//! update and the save.

use std::sync::Mutex;

use crate::run::Run;
use crate::wire::PersistedState;

/// Persists and restores [`PersistedState`]. One run maps to one
/// logical key; callers own the mapping from run identity to key.
#[async_trait::async_trait]
pub trait StateSink: Send + Sync {
    async fn save(&self, state: PersistedState) -> anyhow::Result<()>;
    async fn load(&self) -> anyhow::Result<Option<PersistedState>>;
}

/// Writes through to a [`Run`] directly, bypassing any external store.
/// Useful for tests and for embedding a run without durability.
pub struct InMemorySink {
    slot: Mutex<Option<PersistedState>>,
}

impl Default for InMemorySink {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

#[async_trait::async_trait]
impl StateSink for InMemorySink {
    async fn save(&self, state: PersistedState) -> anyhow::Result<()> {
        *self.slot.lock().expect("in-memory sink poisoned") = Some(state);
        Ok(())
    }

    async fn load(&self) -> anyhow::Result<Option<PersistedState>> {
        Ok(self.slot.lock().expect("in-memory sink poisoned").clone())
    }
}

/// Saves `run`'s current state through `sink`.
pub async fn checkpoint(run: &Run, sink: &dyn StateSink) -> anyhow::Result<()> {
    let persisted = run.to_persisted().await;
    sink.save(persisted)
        .await
        .inspect(|_| log::info!("checkpointed run at iter"))
}

/// Rebuilds a [`Run`] from whatever `sink` has stored, if anything.
/// Propagates [`crate::error::RunError`] if the stored state fails the
/// same validation [`Run::new`] performs (§7: "at load time").
pub async fn restore(sink: &dyn StateSink) -> anyhow::Result<Option<Run>> {
    match sink.load().await? {
        Some(persisted) => Ok(Some(Run::new_from_persisted(persisted)?)),
        None => Ok(None),
    }
}
