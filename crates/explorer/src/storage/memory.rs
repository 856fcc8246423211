//! In-process storage for tests and throwaway sessions.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::traits::KeyValueStore;
use crate::errors::ExplorerResult;
use crate::sync::lock;

/// Map-backed store that forgets everything on drop
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        lock(&self.values).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.values).is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn store_type(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> ExplorerResult<Option<Value>> {
        Ok(lock(&self.values).get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> ExplorerResult<()> {
        lock(&self.values).insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> ExplorerResult<()> {
        lock(&self.values).remove(key);
        Ok(())
    }

    async fn clear(&self) -> ExplorerResult<()> {
        lock(&self.values).clear();
        Ok(())
    }
}
