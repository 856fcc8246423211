//! File-based storage implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::warn;

use super::traits::KeyValueStore;
use crate::errors::{ExplorerError, ExplorerResult};

/// Single JSON object file holding every key
pub struct FileStore {
    /// Path to state.json
    state_file: PathBuf,

    /// Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Create a store backed by `<state_dir>/state.json`
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self::with_file(state_dir.as_ref().join("state.json"))
    }

    /// Create a store backed by an explicit file
    pub fn with_file(state_file: impl Into<PathBuf>) -> Self {
        Self {
            state_file: state_file.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Get the state file path
    pub fn state_file(&self) -> &Path {
        &self.state_file
    }

    /// Read the state file; missing or corrupt files read as empty
    async fn read_state(&self) -> ExplorerResult<Map<String, Value>> {
        match fs::read_to_string(&self.state_file).await {
            Ok(content) => match serde_json::from_str::<Value>(&content) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(_) | Err(_) => {
                    warn!(
                        path = %self.state_file.display(),
                        "State file is corrupt, starting from empty state"
                    );
                    Ok(Map::new())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(ExplorerError::FileReadError {
                path: self.state_file.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Write the state file through a temporary file and rename
    async fn write_state(&self, state: &Map<String, Value>) -> ExplorerResult<()> {
        if let Some(parent) = self.state_file.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(state)?;
        let tmp_file = self.state_file.with_extension("json.tmp");
        fs::write(&tmp_file, content)
            .await
            .map_err(|e| ExplorerError::FileWriteError {
                path: tmp_file.display().to_string(),
                reason: e.to_string(),
            })?;
        fs::rename(&tmp_file, &self.state_file)
            .await
            .map_err(|e| ExplorerError::FileWriteError {
                path: self.state_file.display().to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    fn store_type(&self) -> &'static str {
        "file"
    }

    async fn get(&self, key: &str) -> ExplorerResult<Option<Value>> {
        let state = self.read_state().await?;
        Ok(state.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> ExplorerResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut state = self.read_state().await?;
        state.insert(key.to_string(), value);
        self.write_state(&state).await
    }

    async fn remove(&self, key: &str) -> ExplorerResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut state = self.read_state().await?;
        if state.remove(key).is_some() {
            self.write_state(&state).await?;
        }
        Ok(())
    }

    async fn clear(&self) -> ExplorerResult<()> {
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(&self.state_file).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ExplorerError::FileWriteError {
                path: self.state_file.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }
}
