//! Counter store backends.
//!
//! The store owns the one piece of shared state, so atomicity of the
//! increment lives here and nowhere else: every backend applies
//! add-and-fetch as a single indivisible operation per key.

pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;

use tally_core::counter::{Count, CounterKey};
use tally_core::error::{Result, TallyError};

use crate::config::{StoreKind, StoreSection};

pub use memory::InMemoryCounterStore;
pub use sqlite::SqliteCounterStore;

/// Atomic add-and-fetch capability.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Short backend name used in logs and metric labels.
    fn backend(&self) -> &'static str;

    /// Add `delta` to the attribute addressed by `key` and return the value
    /// after the update. An absent record starts at zero.
    async fn add_and_get(&self, key: &CounterKey, delta: u64) -> Result<Count>;
}

/// Open the backend named by the config.
pub fn open(cfg: &StoreSection) -> Result<Arc<dyn CounterStore>> {
    match cfg.kind {
        StoreKind::Memory => Ok(Arc::new(InMemoryCounterStore::new())),
        StoreKind::Sqlite => {
            let path = cfg
                .path
                .as_deref()
                .ok_or_else(|| TallyError::BadRequest("store.path is required for sqlite".into()))?;
            Ok(Arc::new(SqliteCounterStore::open(path)?))
        }
    }
}
