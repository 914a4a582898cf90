use std::sync::Arc;

use tally_core::counter::{Count, CounterKey};
use tally_core::error::Result;

use crate::config::{CounterConfig, ErrorPolicy, TallyConfig};
use crate::store::CounterStore;

/// One configured counter endpoint: fixed key, response field, error policy,
/// and the store handle it increments through.
pub struct CounterService {
    path: String,
    key: CounterKey,
    field: String,
    policy: ErrorPolicy,
    store: Arc<dyn CounterStore>,
}

impl CounterService {
    pub fn new(
        path: impl Into<String>,
        key: CounterKey,
        field: impl Into<String>,
        policy: ErrorPolicy,
        store: Arc<dyn CounterStore>,
    ) -> Self {
        Self {
            path: path.into(),
            key,
            field: field.into(),
            policy,
            store,
        }
    }

    pub fn from_config(cfg: &TallyConfig, counter: &CounterConfig, store: Arc<dyn CounterStore>) -> Self {
        Self::new(
            counter.path.clone(),
            cfg.counter_key(counter),
            counter.response_field_name.clone(),
            counter.on_store_error,
            store,
        )
    }

    /// One atomic add of 1, returning the post-update count. No dedup: every
    /// call is a new increment.
    pub async fn increment_and_get(&self) -> Result<Count> {
        self.store.add_and_get(&self.key, 1).await
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn key(&self) -> &CounterKey {
        &self.key
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }
}
