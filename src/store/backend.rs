//! キー/値ストアの実装
//!
//! - FileStore: ディレクトリ内の1キー=1ファイル。書き込みは一時ファイル+rename
//! - MemoryStore: テスト・一時セッション用。容量上限を設定できる

use super::KeyValueStore;
use crate::error::PersistenceError;
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    fn write_atomic(&self, key: &str, value: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{}.tmp", key));
        let written = fs::File::create(&tmp)
            .and_then(|mut file| {
                file.write_all(value.as_bytes())?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&tmp, &path));

        if written.is_err() {
            if let Err(e) = fs::remove_file(&tmp) {
                if e.kind() != ErrorKind::NotFound {
                    warn!(path = %tmp.display(), "failed to remove temp file: {}", e);
                }
            }
        }
        written
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistenceError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.write_atomic(key, value)
            .map_err(|source| PersistenceError::Io {
                key: key.to_string(),
                source,
            })
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PersistenceError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// メモリ上のストア
///
/// `capacity` を指定すると、全キー合計のバイト数が上限を超える書き込みを拒否する
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    capacity: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_limit(limit: usize) -> Self {
        Self {
            entries: Mutex::default(),
            capacity: Some(limit),
        }
    }

    /// 生の値を直接書き込む（破損データの再現用）
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.lock().insert(key.to_string(), value.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut entries = self.lock();
        if let Some(limit) = self.capacity {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let size = others + value.len();
            if size > limit {
                return Err(PersistenceError::QuotaExceeded {
                    key: key.to_string(),
                    size,
                    limit,
                });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("state"));

        assert_eq!(store.get("theme").unwrap(), None);
        store.set("theme", "dark").unwrap();
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
        assert!(!dir.path().join("state").join(".theme.tmp").exists());

        store.set("theme", "light").unwrap();
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("light"));

        store.remove("theme").unwrap();
        store.remove("theme").unwrap();
        assert_eq!(store.get("theme").unwrap(), None);
    }

    #[test]
    fn test_file_store_failed_write_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        // 同名の空でないディレクトリがあると rename できない
        let blocker = store.path_for("theme");
        fs::create_dir_all(&blocker).unwrap();
        fs::write(blocker.join("keep"), "x").unwrap();

        assert!(store.set("theme", "dark").is_err());
        assert!(!dir.path().join(".theme.tmp").exists());
        assert!(blocker.is_dir());
    }

    #[test]
    fn test_memory_store_capacity() {
        let store = MemoryStore::with_capacity_limit(10);
        store.set("a", "12345").unwrap();
        // 同じキーの上書きは旧値を数えない
        store.set("a", "1234567890").unwrap();

        let err = store.set("b", "x").unwrap_err();
        assert!(matches!(err, PersistenceError::QuotaExceeded { size: 11, limit: 10, .. }));
        assert_eq!(store.raw("b"), None);
    }
}
