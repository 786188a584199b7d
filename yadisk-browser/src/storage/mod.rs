mod token_storage;

pub use token_storage::{KeyValueStore, KeyringStore, MemoryStore, StorageError};
