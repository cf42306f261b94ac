use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::warn;

/// 候选分类
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAlternative {
    pub category: String,
    pub confidence: f64,
}

/// 分类结果（持久化）
///
/// `id` 与产生它的任务 `file_id` 相同，是去重键。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub id: String,
    pub filename: String,
    /// 结果可用时的 Unix 秒
    #[serde(default)]
    pub timestamp: i64,
    pub category: String,
    pub confidence: f64,
    #[serde(default)]
    pub text_preview: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternatives: Option<Vec<CategoryAlternative>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
}

impl ClassificationResult {
    /// 补齐缺失的时间戳，并把置信度限制在 [0, 1]
    pub fn normalized(mut self) -> Self {
        if self.timestamp <= 0 {
            self.timestamp = chrono::Utc::now().timestamp();
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            warn!(
                "结果 {} 的置信度 {} 超出 [0, 1]，已截断",
                self.id, self.confidence
            );
            self.confidence = if self.confidence.is_nan() {
                0.0
            } else {
                self.confidence.clamp(0.0, 1.0)
            };
        }
        self
    }
}

// ========== 排序 ==========

/// 排序字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortField {
    Filename,
    Category,
    Confidence,
    #[default]
    Timestamp,
}

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// 结果排序方式，默认按时间倒序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResultOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl ResultOrder {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// 原地排序（稳定排序，相等时保持插入顺序）
    pub fn sort(&self, results: &mut [ClassificationResult]) {
        results.sort_by(|a, b| {
            let ordering = match self.field {
                SortField::Filename => a.filename.cmp(&b.filename),
                SortField::Category => a.category.cmp(&b.category),
                SortField::Confidence => a
                    .confidence
                    .partial_cmp(&b.confidence)
                    .unwrap_or(Ordering::Equal),
                SortField::Timestamp => a.timestamp.cmp(&b.timestamp),
            };
            match self.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }
}
