//! In-process [`KvStore`] implementations.
//!
//! [`MemoryKvStore`] is for tests and embedding; [`JsonFileKvStore`] keeps the
//! whole map in one JSON file so records survive between CLI invocations.
//! Both hold their map behind a `tokio::sync::Mutex`; neither offers
//! compare-and-swap, so concurrent writers to one key are last-write-wins.

use super::{KvEntry, KvStore};
use crate::error::BackendError;
use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Compile a glob where `*` stands for any run of characters into an
/// anchored regex. Every other character matches itself.
fn glob_regex(pattern: &str) -> Option<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{body}$")).ok()
}

/// Match `key` against a glob where `*` stands for any run of characters.
/// Every other character matches itself.
pub fn glob_match(pattern: &str, key: &str) -> bool {
    glob_regex(pattern).is_some_and(|re| re.is_match(key))
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> BackendError {
    let path = path.to_path_buf();
    move |source| BackendError::Io { path, source }
}

fn list_matching(map: &BTreeMap<String, String>, pattern: &str) -> Vec<KvEntry> {
    let Some(re) = glob_regex(pattern) else {
        return Vec::new();
    };
    map.iter()
        .filter(|(k, _)| re.is_match(k))
        .map(|(k, v)| KvEntry {
            key: k.clone(),
            value: v.clone(),
        })
        .collect()
}

// ── Memory ───────────────────────────────────────────────────────────────

/// A key-value store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    map: Mutex<BTreeMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        Ok(self.map.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), BackendError> {
        self.map.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn list(&self, pattern: &str) -> Result<Vec<KvEntry>, BackendError> {
        Ok(list_matching(&*self.map.lock().await, pattern))
    }
}

// ── JSON file ────────────────────────────────────────────────────────────

/// A key-value store persisted as a single JSON object on disk.
///
/// Every `set` rewrites the file atomically (temp file + rename), so a crash
/// mid-write leaves the previous version intact.
#[derive(Debug)]
pub struct JsonFileKvStore {
    path: PathBuf,
    map: Mutex<BTreeMap<String, String>>,
}

impl JsonFileKvStore {
    /// Open the store at `path`, loading existing entries if the file exists.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let path = path.into();
        let map = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(BackendError::Io { path, source }),
        };
        info!("Opened key-value store {} ({} keys)", path.display(), map.len());
        Ok(Self {
            path,
            map: Mutex::new(map),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, map: &BTreeMap<String, String>) -> Result<(), BackendError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err(parent))?;
        }
        let body = serde_json::to_vec_pretty(map)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &body)
            .await
            .map_err(io_err(&tmp_path))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(io_err(&self.path))?;
        debug!("Persisted {} keys to {}", map.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl KvStore for JsonFileKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        Ok(self.map.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), BackendError> {
        // Held across the write so two sets cannot interleave on disk.
        let mut map = self.map.lock().await;
        let mut next = map.clone();
        next.insert(key.to_string(), value);
        self.persist(&next).await?;
        *map = next;
        Ok(())
    }

    async fn list(&self, pattern: &str) -> Result<Vec<KvEntry>, BackendError> {
        Ok(list_matching(&*self.map.lock().await, pattern))
    }
}
