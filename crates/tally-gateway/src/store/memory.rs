use async_trait::async_trait;
use dashmap::DashMap;

use tally_core::counter::{Count, CounterKey};
use tally_core::error::Result;

use super::CounterStore;

/// In-process store. The `DashMap` entry guard serializes adds on one key.
#[derive(Default)]
pub struct InMemoryCounterStore {
    records: DashMap<CounterKey, Count>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Set a record's value directly. Test and fixture helper.
    pub fn seed(&self, key: CounterKey, value: u64) {
        self.records.insert(key, Count::new(value));
    }

    /// Current value without incrementing. Test and inspection helper.
    pub fn peek(&self, key: &CounterKey) -> Option<Count> {
        self.records.get(key).map(|r| *r.value())
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn add_and_get(&self, key: &CounterKey, delta: u64) -> Result<Count> {
        let mut entry = self.records.entry(key.clone()).or_insert(Count::ZERO);
        let next = entry.checked_add(delta)?;
        *entry = next;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> CounterKey {
        CounterKey::new("visitor-count", "visitors", "visitor_count")
    }

    #[tokio::test]
    async fn absent_record_starts_at_zero() {
        let store = InMemoryCounterStore::new();
        assert_eq!(store.peek(&key()), None);
        assert_eq!(store.add_and_get(&key(), 1).await.unwrap(), Count::new(1));
        assert_eq!(store.peek(&key()), Some(Count::new(1)));
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let store = InMemoryCounterStore::new();
        let other = CounterKey::new("visitor-count", "counter", "visitor_count");
        store.seed(key(), 10);
        assert_eq!(store.add_and_get(&other, 1).await.unwrap(), Count::new(1));
        assert_eq!(store.add_and_get(&key(), 1).await.unwrap(), Count::new(11));
    }

    #[tokio::test]
    async fn overflow_leaves_value_untouched() {
        let store = InMemoryCounterStore::new();
        store.seed(key(), u64::MAX);
        assert!(store.add_and_get(&key(), 1).await.unwrap_err().is_store_failure());
        assert_eq!(store.peek(&key()), Some(Count::new(u64::MAX)));
    }
}
