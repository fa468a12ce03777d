//! Named key-value slots holding the serialized history blob.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::AsyncCommands;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum SlotError {
    #[error("slot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("history encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A process-external store of string blobs addressed by name.
#[async_trait]
pub trait KeyValueSlot: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, SlotError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), SlotError>;
    async fn remove(&self, key: &str) -> Result<(), SlotError>;
}

/// Opens the slot backend named by `HISTORY_STORE_URL`.
///
/// `memory:` keeps history in-process, `redis://` / `rediss://` uses Redis,
/// anything else is a directory of JSON files.
pub fn open_slot(url: &str) -> Result<Arc<dyn KeyValueSlot>> {
    if url == "memory:" {
        return Ok(Arc::new(MemorySlot::default()));
    }
    if url.starts_with("redis://") || url.starts_with("rediss://") {
        let client = redis::Client::open(url)
            .with_context(|| format!("Invalid Redis URL for history store: {url}"))?;
        return Ok(Arc::new(RedisSlot::new(client)));
    }
    Ok(Arc::new(FileSlot::new(url)))
}

// ────────────────────────────────────────────────────────────────────────────
// In-process
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemorySlot {
    entries: RwLock<HashMap<String, String>>,
}

#[async_trait]
impl KeyValueSlot for MemorySlot {
    async fn get(&self, key: &str) -> Result<Option<String>, SlotError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SlotError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SlotError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// File-backed: one JSON file per key
// ────────────────────────────────────────────────────────────────────────────

pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }
}

/// Maps a key onto a file stem. ASCII alphanumerics and `-` pass through,
/// every other byte becomes `_xx` so distinct keys never share a file.
fn encode_key(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("_{byte:02x}"));
        }
    }
    stem
}

#[async_trait]
impl KeyValueSlot for FileSlot {
    async fn get(&self, key: &str) -> Result<Option<String>, SlotError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SlotError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        // Write-then-rename so a crash never leaves a half-written blob.
        let tmp = tmp_path(&path);
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SlotError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

// ────────────────────────────────────────────────────────────────────────────
// Redis
// ────────────────────────────────────────────────────────────────────────────

pub struct RedisSlot {
    client: redis::Client,
}

impl RedisSlot {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl KeyValueSlot for RedisSlot {
    async fn get(&self, key: &str) -> Result<Option<String>, SlotError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn.get::<_, Option<String>>(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SlotError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SlotError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_slot_set_get_remove() {
        let slot = MemorySlot::default();
        assert_eq!(slot.get("k").await.unwrap(), None);

        slot.set("k", "[1]").await.unwrap();
        assert_eq!(slot.get("k").await.unwrap().as_deref(), Some("[1]"));

        slot.remove("k").await.unwrap();
        assert_eq!(slot.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_slot_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history");

        FileSlot::new(&path).set("recommendationHistory", "[]").await.unwrap();

        let reopened = FileSlot::new(&path);
        assert_eq!(
            reopened.get("recommendationHistory").await.unwrap().as_deref(),
            Some("[]")
        );
    }

    #[tokio::test]
    async fn test_file_slot_missing_key_and_remove_are_benign() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::new(dir.path());
        assert_eq!(slot.get("absent").await.unwrap(), None);
        slot.remove("absent").await.unwrap();
    }

    #[test]
    fn test_encode_key_keeps_distinct_keys_distinct() {
        assert_eq!(encode_key("recommendationHistory"), "recommendationHistory");
        assert_ne!(encode_key("a:b"), encode_key("a_b"));
        assert_ne!(encode_key("a/b"), encode_key("a:b"));
        assert!(!encode_key("../etc").contains('/'));
    }

    #[test]
    fn test_open_slot_accepts_every_backend_scheme() {
        // Client::open only parses the URL; no connection is made here.
        assert!(open_slot("redis://127.0.0.1:6379").is_ok());
        assert!(open_slot("memory:").is_ok());
        assert!(open_slot("/tmp/quiz-history").is_ok());
    }
}
