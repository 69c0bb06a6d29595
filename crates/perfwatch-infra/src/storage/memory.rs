// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use perfwatch_core::storage::KeyValueStore;
use perfwatch_core::{TelemetryError, TelemetryResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// In-memory key-value store using RwLock<HashMap>
///
/// Useful for tests and for processes that do not need data to outlive them.
/// [`set_failing`](Self::set_failing) simulates a storage outage.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    /// The core storage - RwLock allows concurrent reads
    storage: RwLock<HashMap<String, Value>>,
    failing: AtomicBool,
}

impl InMemoryStore {
    /// Create a new, empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent read and write fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.storage.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Returns true if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> TelemetryResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TelemetryError::Storage(
                "in-memory store is unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> TelemetryResult<Option<Value>> {
        self.check_available()?;
        let storage = self
            .storage
            .read()
            .map_err(|_| TelemetryError::Storage("Failed to acquire read lock".to_string()))?;
        Ok(storage.get(key).cloned())
    }

    fn put(&self, key: &str, value: Value) -> TelemetryResult<()> {
        self.check_available()?;
        let mut storage = self
            .storage
            .write()
            .map_err(|_| TelemetryError::Storage("Failed to acquire write lock".to_string()))?;
        storage.insert(key.to_string(), value);
        Ok(())
    }

    fn put_all(&self, entries: Vec<(String, Value)>) -> TelemetryResult<()> {
        self.check_available()?;
        let mut storage = self
            .storage
            .write()
            .map_err(|_| TelemetryError::Storage("Failed to acquire write lock".to_string()))?;
        storage.extend(entries);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_in_memory_store_basic_operations() {
        let store = InMemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("missing").unwrap(), None);

        store.put("a", json!({"x": 1})).unwrap();
        assert_eq!(store.get("a").unwrap(), Some(json!({"x": 1})));

        store.put("a", json!([])).unwrap();
        assert_eq!(store.get("a").unwrap(), Some(json!([])));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_bulk_put() {
        let store = InMemoryStore::new();
        store
            .put_all(vec![
                ("performanceMetrics".to_string(), json!({})),
                ("performanceViolations".to_string(), json!({})),
            ])
            .unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_failing_store() {
        let store = InMemoryStore::new();
        store.put("a", json!(1)).unwrap();

        store.set_failing(true);
        assert!(matches!(store.get("a"), Err(TelemetryError::Storage(_))));
        assert!(store.put("b", json!(2)).is_err());

        store.set_failing(false);
        assert_eq!(store.get("a").unwrap(), Some(json!(1)));
        assert_eq!(store.get("b").unwrap(), None);
    }
}
