use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::core::types::CachedAnalysis;

/// Memoizes full analysis tuples keyed by content fingerprint, with a
/// TTL. Purely an optimization: every failure path (poisoned lock, bad
/// disk file, serialization error) degrades to a miss or no-op, never
/// to an analysis failure. A TTL of zero disables caching.
pub struct FingerprintCache {
    ttl: Duration,
    memory: Mutex<HashMap<String, (CachedAnalysis, Instant)>>,
    disk: Option<DiskLayer>,
}

impl FingerprintCache {
    pub fn new(ttl: Duration, disk_path: Option<&Path>) -> Self {
        let disk = disk_path.and_then(|p| match DiskLayer::new(p) {
            Ok(layer) => {
                if let Err(err) = layer.purge_expired(ttl) {
                    tracing::debug!("disk cache purge failed: {err}");
                }
                Some(layer)
            }
            Err(err) => {
                tracing::warn!("disk cache at {} unavailable: {err}", p.display());
                None
            }
        });
        Self {
            ttl,
            memory: Mutex::new(HashMap::new()),
            disk,
        }
    }

    pub fn get(&self, key: &str) -> Option<CachedAnalysis> {
        if self.ttl.is_zero() {
            return None;
        }
        if let Ok(memory) = self.memory.lock() {
            if let Some((value, stored_at)) = memory.get(key) {
                if stored_at.elapsed() < self.ttl {
                    return Some(value.clone());
                }
            }
        }
        let value = self.disk.as_ref()?.get(key, self.ttl)?;
        // Refresh the memory layer so the next hit skips disk I/O.
        if let Ok(mut memory) = self.memory.lock() {
            memory.insert(key.to_string(), (value.clone(), Instant::now()));
        }
        Some(value)
    }

    pub fn put(&self, key: &str, value: &CachedAnalysis) {
        if self.ttl.is_zero() {
            return;
        }
        if let Ok(mut memory) = self.memory.lock() {
            memory.insert(key.to_string(), (value.clone(), Instant::now()));
        }
        if let Some(disk) = &self.disk {
            if let Err(err) = disk.put(key, value) {
                tracing::debug!("disk cache write failed for {key}: {err}");
            }
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct StoredEntry {
    value: CachedAnalysis,
    timestamp_ms: u128,
}

/// JSON file map keyed by fingerprint, entries stamped with unix
/// milliseconds.
struct DiskLayer {
    path: PathBuf,
}

impl DiskLayer {
    fn new(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        if !path.exists() {
            fs::write(path, b"{}\n")?;
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    fn get(&self, key: &str, ttl: Duration) -> Option<CachedAnalysis> {
        let map = self.read_map();
        let entry = map.get(key)?;
        let age = now_ms().saturating_sub(entry.timestamp_ms);
        if age < ttl.as_millis() {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    fn put(&self, key: &str, value: &CachedAnalysis) -> std::io::Result<()> {
        let mut map = self.read_map();
        map.insert(
            key.to_string(),
            StoredEntry {
                value: value.clone(),
                timestamp_ms: now_ms(),
            },
        );
        self.write_map(&map)
    }

    fn purge_expired(&self, ttl: Duration) -> std::io::Result<()> {
        let mut map = self.read_map();
        let now = now_ms();
        map.retain(|_, entry| now.saturating_sub(entry.timestamp_ms) < ttl.as_millis());
        self.write_map(&map)
    }

    fn read_map(&self) -> HashMap<String, StoredEntry> {
        // Unreadable or corrupt files behave as an empty cache.
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|data| serde_json::from_str(&data).ok())
            .unwrap_or_default()
    }

    fn write_map(&self, map: &HashMap<String, StoredEntry>) -> std::io::Result<()> {
        let json = serde_json::to_string(map)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, json)
    }
}

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}
