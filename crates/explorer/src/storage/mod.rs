//! Persistence port and its implementations.

mod file;
mod memory;
mod persisted;
mod traits;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use persisted::{keys, read_key, write_key, PersistedState};
pub use traits::KeyValueStore;
