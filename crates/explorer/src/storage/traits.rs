//! Storage trait definitions.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ExplorerResult;

/// Key-value persistence port for session state.
///
/// Values are plain JSON so any implementation can store them verbatim.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get storage type identifier
    fn store_type(&self) -> &'static str;

    /// Read a value; `None` when the key was never written
    async fn get(&self, key: &str) -> ExplorerResult<Option<Value>>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: Value) -> ExplorerResult<()>;

    /// Remove a single key
    async fn remove(&self, key: &str) -> ExplorerResult<()>;

    /// Remove every key
    async fn clear(&self) -> ExplorerResult<()>;
}
