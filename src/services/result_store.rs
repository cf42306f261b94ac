//! 结果仓库 - 业务能力层
//!
//! 只负责"保存已完成的分类结果"能力：按 id 去重、按插入顺序保存、
//! 每次变更后整份写回持久化存储。

use crate::error::{AppResult, PersistenceError};
use crate::infrastructure::SnapshotStorage;
use crate::models::ClassificationResult;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 结果仓库
///
/// 职责：
/// - 同一 id 最多保存一条（先写入者保留）
/// - 内存中的数据是本次会话的权威来源
/// - 持久化失败只记录日志，不向调用方报错
pub struct ResultStore {
    results: Vec<ClassificationResult>,
    storage: Arc<dyn SnapshotStorage>,
    key: String,
}

impl ResultStore {
    /// 创建空仓库（不读取持久化内容）
    pub fn new(storage: Arc<dyn SnapshotStorage>, key: impl Into<String>) -> Self {
        Self {
            results: Vec::new(),
            storage,
            key: key.into(),
        }
    }

    /// 创建并从持久化存储恢复
    pub fn open(storage: Arc<dyn SnapshotStorage>, key: impl Into<String>) -> Self {
        let mut store = Self::new(storage, key);
        store.load();
        store
    }

    /// 从持久化存储恢复快照
    ///
    /// 快照缺失、读取失败或内容损坏都按空仓库处理。
    pub fn load(&mut self) {
        self.results = match self.read_snapshot() {
            Ok(Some(results)) => {
                info!("✓ 已恢复 {} 条分类结果", results.len());
                results
            }
            Ok(None) => {
                debug!("没有找到已保存的快照 (key: {})", self.key);
                Vec::new()
            }
            Err(e) => {
                warn!("⚠️ 无法恢复已保存的结果，按空仓库处理: {}", e);
                Vec::new()
            }
        };
    }

    fn read_snapshot(&self) -> AppResult<Option<Vec<ClassificationResult>>> {
        let Some(contents) = self.storage.read(&self.key)? else {
            return Ok(None);
        };

        let parsed: Vec<ClassificationResult> =
            serde_json::from_str(&contents).map_err(|source| PersistenceError::Corrupt {
                key: self.key.clone(),
                source,
            })?;

        // 快照里出现重复 id 时同样保留第一条
        let mut seen = HashSet::new();
        let total = parsed.len();
        let results: Vec<_> = parsed
            .into_iter()
            .filter(|r| seen.insert(r.id.clone()))
            .collect();
        if results.len() != total {
            warn!("快照中有 {} 条重复结果，已忽略", total - results.len());
        }

        Ok(Some(results))
    }

    /// 插入结果，id 已存在时不做任何修改
    ///
    /// # 返回
    /// 是否真正插入
    pub fn insert(&mut self, result: ClassificationResult) -> bool {
        if self.contains(&result.id) {
            debug!("结果 {} 已存在，忽略重复插入", result.id);
            return false;
        }

        info!(
            "✓ 保存结果: {} → {} ({:.2})",
            result.filename, result.category, result.confidence
        );
        self.results.push(result);
        self.persist();
        true
    }

    /// 删除结果
    ///
    /// # 返回
    /// 是否真正删除
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.results.len();
        self.results.retain(|r| r.id != id);
        let removed = self.results.len() != before;

        if removed {
            info!("🗑️ 已删除结果: {}", id);
        } else {
            debug!("结果 {} 不存在，无需删除", id);
        }
        self.persist();
        removed
    }

    /// 当前全部结果，按插入顺序
    pub fn snapshot(&self) -> Vec<ClassificationResult> {
        self.results.clone()
    }

    pub fn get(&self, id: &str) -> Option<&ClassificationResult> {
        self.results.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// 整份写回，失败只记录日志
    fn persist(&self) {
        let contents = match serde_json::to_string(&self.results) {
            Ok(contents) => contents,
            Err(e) => {
                error!("❌ 结果序列化失败，本次未写入: {}", e);
                return;
            }
        };

        if let Err(e) = self.storage.write(&self.key, &contents) {
            error!("❌ 结果写入失败（内存数据仍然有效）: {}", e);
        }
    }
}
