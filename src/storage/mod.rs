// Durable key/value storage.
// The raw layer under the persistent cache and the rate-limit guard: string keys, string values.

pub mod file;
pub mod memory;
pub mod paths;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::StorageError;

/// A durable string store keyed by storage key.
///
/// Implementations may fail at any time (disk full, directory removed,
/// storage disabled). Callers in this crate treat every failure as a
/// miss or a dropped write.
pub trait Storage: Send + Sync {
    /// Read the raw value for `key`, `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value for `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the value for `key`. Deleting an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
