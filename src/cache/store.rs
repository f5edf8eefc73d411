// Persistent cache over durable storage.
// Reads never fail (errors and unparseable data are misses); writes that fail are dropped.

use std::any::type_name;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::error::{HydrantError, Result};
use crate::storage::{Storage, paths};

use super::entry::CacheEntry;
use super::namespace::{Layout, Namespace};

/// Default TTL for GitHub-backed widgets: 6 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Which resource kind owns a storage file.
#[derive(Debug, Clone)]
struct Registration {
    storage_key: String,
    layout: Layout,
    payload: &'static str,
}

/// TTL-aware key/entry store shared by every hydrator in the process.
pub struct PersistentCache {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    // Keyed by file name: distinct storage keys may sanitize to the same file.
    registry: Mutex<HashMap<String, Registration>>,
    // Serializes read-modify-write of keyed namespaces within this process.
    write_lock: Mutex<()>,
}

impl PersistentCache {
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            registry: Mutex::new(HashMap::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Current time according to the cache's clock.
    pub fn now(&self) -> u64 {
        self.clock.now_millis()
    }

    /// Claim a namespace for payload type `T`.
    ///
    /// Registering the same storage key again with the same layout and
    /// payload type is a no-op. Anything else that lands in the same storage
    /// file, including a different key that sanitizes to the same file name,
    /// is a conflict.
    pub fn register<T>(&self, namespace: &Namespace) -> Result<()> {
        let key = namespace.storage_key();
        let file = paths::file_name(&key);
        let wanted = Registration {
            storage_key: key.clone(),
            layout: namespace.layout(),
            payload: type_name::<T>(),
        };

        let mut registry = self
            .registry
            .lock()
            .map_err(|_| HydrantError::Config("cache registry lock poisoned".to_string()))?;

        let Some(existing) = registry.get(&file) else {
            registry.insert(file, wanted);
            return Ok(());
        };

        let existing = if existing.storage_key != wanted.storage_key {
            "a different key in the same file"
        } else if existing.layout != wanted.layout {
            existing.layout.as_str()
        } else if existing.payload != wanted.payload {
            existing.payload
        } else {
            return Ok(());
        };
        Err(HydrantError::NamespaceConflict { key, existing })
    }

    /// Read the entry for `item` in `namespace`.
    ///
    /// Single namespaces hold one resource; `item` is only used to label the
    /// returned entry. Returns `None` on a miss, a storage failure, or data
    /// that does not parse as `CacheEntry<T>`.
    pub fn get<T: DeserializeOwned>(
        &self,
        namespace: &Namespace,
        item: &str,
    ) -> Option<CacheEntry<T>> {
        let storage_key = namespace.storage_key();
        let raw = self.read_raw(&storage_key)?;

        let parsed = match namespace.layout() {
            Layout::Single => serde_json::from_str::<CacheEntry<T>>(&raw),
            Layout::Keyed => {
                let mut map = parse_map(&raw)?;
                let value = map.remove(item)?;
                serde_json::from_value::<CacheEntry<T>>(value)
            }
        };

        match parsed {
            Ok(mut entry) => {
                entry.key = item.to_string();
                Some(entry)
            }
            Err(e) => {
                debug!(key = %storage_key, item, error = %e, "discarding unreadable cache entry");
                None
            }
        }
    }

    /// Write `payload` for `item` in `namespace`, stamped with the current time.
    ///
    /// Failures are logged and dropped.
    pub fn set<T: Serialize>(&self, namespace: &Namespace, item: &str, payload: &T, ttl: Duration) {
        let storage_key = namespace.storage_key();
        let entry = CacheEntry::new(item, payload, self.now(), ttl);

        if let Err(e) = self.write_entry(namespace, &storage_key, item, &entry) {
            warn!(key = %storage_key, item, error = %e, "cache write dropped");
        }
    }

    /// Delete everything stored under `namespace`.
    pub fn clear(&self, namespace: &Namespace) {
        let storage_key = namespace.storage_key();
        if let Err(e) = self.storage.remove(&storage_key) {
            warn!(key = %storage_key, error = %e, "cache clear failed");
        }
    }

    fn write_entry<T: Serialize>(
        &self,
        namespace: &Namespace,
        storage_key: &str,
        item: &str,
        entry: &CacheEntry<&T>,
    ) -> Result<()> {
        match namespace.layout() {
            Layout::Single => {
                let json = serde_json::to_string(entry)?;
                self.storage.set(storage_key, &json)?;
            }
            Layout::Keyed => {
                let _guard = self
                    .write_lock
                    .lock()
                    .map_err(|_| HydrantError::Config("cache write lock poisoned".to_string()))?;

                // An unreadable map is replaced rather than merged.
                let mut map = self
                    .read_raw(storage_key)
                    .and_then(|raw| parse_map(&raw))
                    .unwrap_or_default();
                map.insert(item.to_string(), serde_json::to_value(entry)?);

                let json = serde_json::to_string(&map)?;
                self.storage.set(storage_key, &json)?;
            }
        }
        Ok(())
    }

    fn read_raw(&self, storage_key: &str) -> Option<String> {
        match self.storage.get(storage_key) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(key = %storage_key, error = %e, "storage read failed, treating as miss");
                None
            }
        }
    }
}

fn parse_map(raw: &str) -> Option<HashMap<String, Value>> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Some(map.into_iter().collect()),
        _ => None,
    }
}
