//! 快照存储 - 基础设施层
//!
//! 持有本地持久化资源，只暴露"按键读写整份快照"的能力

use crate::error::{AppResult, PersistenceError};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

/// 按键存取的持久化快照
///
/// 职责：
/// - 读取/覆盖写入一个键对应的完整内容
/// - 不认识 ClassificationResult
/// - 不做去重、不做序列化
pub trait SnapshotStorage: Send + Sync {
    /// 读取快照，不存在时返回 None
    fn read(&self, key: &str) -> AppResult<Option<String>>;

    /// 覆盖写入快照
    fn write(&self, key: &str, contents: &str) -> AppResult<()>;
}

/// 文件快照存储：每个键对应 `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileSnapshotStorage {
    dir: PathBuf,
}

impl FileSnapshotStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl SnapshotStorage for FileSnapshotStorage {
    fn read(&self, key: &str) -> AppResult<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistenceError::ReadFailed {
                path: path.display().to_string(),
                source,
            }
            .into()),
        }
    }

    fn write(&self, key: &str, contents: &str) -> AppResult<()> {
        let path = self.path_for(key);
        let write_failed = |source: std::io::Error| PersistenceError::WriteFailed {
            path: path.display().to_string(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(write_failed)?;

        // 先写临时文件再重命名，避免中途失败留下半份快照
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        std::fs::write(&tmp, contents).map_err(write_failed)?;
        std::fs::rename(&tmp, &path).map_err(write_failed)?;

        debug!("快照已写入: {} ({} 字节)", path.display(), contents.len());
        Ok(())
    }
}

/// 内存快照存储，可在多个 ResultStore 之间共享以模拟重启
#[derive(Debug, Default)]
pub struct MemorySnapshotStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySnapshotStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置内容
    pub fn with_entry(key: impl Into<String>, contents: impl Into<String>) -> Self {
        let storage = Self::new();
        storage
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.into(), contents.into());
        storage
    }
}

impl SnapshotStorage for MemorySnapshotStorage {
    fn read(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, contents: &str) -> AppResult<()> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), contents.to_string());
        Ok(())
    }
}
