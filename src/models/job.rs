//! 任务模型
//!
//! 一个 `Job` 对应一次上传提交的完整生命周期，只存在于内存中。

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 任务状态
///
/// `Completed` 与 `Error` 为终态，进入终态后不再发生任何迁移。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Uploaded,
    Processing,
    Completed,
    Error,
}

impl JobState {
    /// 解析远端返回的状态字符串，不认识的状态返回 None
    pub fn from_remote(status: &str) -> Option<Self> {
        match status.trim().to_ascii_lowercase().as_str() {
            "uploaded" => Some(JobState::Uploaded),
            "processing" => Some(JobState::Processing),
            "completed" => Some(JobState::Completed),
            "error" => Some(JobState::Error),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Uploaded => "uploaded",
            JobState::Processing => "processing",
            JobState::Completed => "completed",
            JobState::Error => "error",
        }
    }
}

impl Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 任务
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    /// 远端分配的 ID
    pub file_id: String,
    /// 原始文件名
    pub filename: String,
    pub state: JobState,
    /// 进度百分比，直接显示远端最新值
    pub progress: u32,
    /// 仅在 `state == Error` 时存在
    pub error_detail: Option<String>,
}

/// 应用一次远端状态后的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// 状态或进度发生变化
    Changed,
    /// 与本地缓存一致
    Unchanged,
    /// 已处于终态，忽略
    Ignored,
}

impl Job {
    /// 提交成功后创建，初始状态为 `Uploaded`、进度 0
    pub fn new(file_id: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            filename: filename.into(),
            state: JobState::Uploaded,
            progress: 0,
            error_detail: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// 应用远端状态
    pub fn apply(&mut self, state: JobState, progress: u32, error: Option<String>) -> Transition {
        if self.is_terminal() {
            return Transition::Ignored;
        }

        let progress = progress.min(100);
        if self.state == state && self.progress == progress {
            return Transition::Unchanged;
        }

        self.state = state;
        self.progress = progress;
        if state == JobState::Error {
            self.error_detail = Some(error.unwrap_or_else(|| UNKNOWN_ERROR.to_string()));
        }
        Transition::Changed
    }

    /// 强制进入 `Error`（例如结果拉取失败）
    pub fn fail(&mut self, detail: impl Into<String>) -> Transition {
        if self.is_terminal() {
            return Transition::Ignored;
        }
        self.state = JobState::Error;
        self.error_detail = Some(detail.into());
        Transition::Changed
    }
}

impl Display for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[文件 {} #{}]", self.filename, self.file_id)
    }
}

/// 远端未给出错误详情时的兜底文案
pub const UNKNOWN_ERROR: &str = "Unknown error";

// ========== 远端响应 ==========

/// `POST /upload` 响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub file_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// `GET /upload-status/{file_id}` 响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusResponse {
    pub fn new(status: JobState, progress: u32) -> Self {
        Self {
            status: status.as_str().to_string(),
            progress,
            filename: String::new(),
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// `DELETE /results/{file_id}` 响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}
