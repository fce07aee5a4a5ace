//! Resource cache - key-value persistence for the collected graph.
//!
//! The cache is rebuilt wholesale by every collect pass (clear, then bulk
//! write) and read-only between passes. Backends are external collaborators
//! (disk, Redis); [`MemoryStore`] is the in-process implementation used by
//! tools that do not persist across runs.

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Reserved key for the freshness stamp written by each collect pass.
pub const META_KEY: &str = "meta";

/// Freshness stamp stored under [`META_KEY`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaStamp {
    /// Unix seconds at which the pass completed.
    pub collected_at: u64,
    /// Number of resources written alongside this stamp.
    pub resource_count: usize,
}

impl MetaStamp {
    pub fn new(resource_count: usize) -> Self {
        use std::time::SystemTime;
        let collected_at = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            collected_at,
            resource_count,
        }
    }
}

// ============================================================================
// ResourceStore
// ============================================================================

/// Key-value cache with JSON-serializable values.
///
/// Every operation is fallible; persistent backends surface their I/O
/// failures here and collect propagates them as `RouteError::Other`.
pub trait ResourceStore: Send + Sync {
    /// Drop every entry, including the meta stamp.
    fn clear(&self) -> anyhow::Result<()>;

    /// Insert or replace one entry.
    fn set(&self, key: &str, value: JsonValue) -> anyhow::Result<()>;

    /// Fetch entries for the given keys, `None` per missing key.
    fn get(&self, keys: &[&str]) -> anyhow::Result<Vec<Option<JsonValue>>>;

    /// All resource keys in insertion order, excluding [`META_KEY`].
    fn keys(&self) -> anyhow::Result<Vec<String>>;

    /// All entries in insertion order, excluding [`META_KEY`].
    fn get_all(&self) -> anyhow::Result<Vec<(String, JsonValue)>>;
}

// ============================================================================
// MemoryStore
// ============================================================================

/// In-process store: a concurrent map plus an insertion-order key log so
/// `keys()` / `get_all()` are deterministic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, JsonValue>,
    order: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The freshness stamp of the last completed collect, if any.
    pub fn meta(&self) -> Option<MetaStamp> {
        let value = self.entries.get(META_KEY)?;
        serde_json::from_value(value.clone()).ok()
    }
}

impl ResourceStore for MemoryStore {
    fn clear(&self) -> anyhow::Result<()> {
        self.entries.clear();
        self.order.lock().clear();
        Ok(())
    }

    fn set(&self, key: &str, value: JsonValue) -> anyhow::Result<()> {
        if self.entries.insert(key.to_string(), value).is_none() {
            self.order.lock().push(key.to_string());
        }
        Ok(())
    }

    fn get(&self, keys: &[&str]) -> anyhow::Result<Vec<Option<JsonValue>>> {
        Ok(keys
            .iter()
            .map(|key| self.entries.get(*key).map(|v| v.clone()))
            .collect())
    }

    fn keys(&self) -> anyhow::Result<Vec<String>> {
        Ok(self
            .order
            .lock()
            .iter()
            .filter(|k| k.as_str() != META_KEY)
            .cloned()
            .collect())
    }

    fn get_all(&self) -> anyhow::Result<Vec<(String, JsonValue)>> {
        let order = self.order.lock();
        Ok(order
            .iter()
            .filter(|k| k.as_str() != META_KEY)
            .filter_map(|k| self.entries.get(k).map(|v| (k.clone(), v.clone())))
            .collect())
    }
}
