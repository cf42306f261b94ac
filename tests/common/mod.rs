//! 集成测试共用的脚本化远端客户端

#![allow(dead_code)]

use async_trait::async_trait;
use resume_upload::error::{AppError, AppResult};
use resume_upload::models::{
    ClassificationResult, DeleteResponse, JobState, StatusResponse, UploadFile, UploadResponse,
};
use resume_upload::RemoteJobClient;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const STORAGE_KEY: &str = "resumeClassificationResults";

/// 一次状态查询的脚本
#[derive(Clone)]
pub enum Step {
    Status(StatusResponse),
    /// 网络错误
    Transport,
    /// 远端不认识该 id
    NotFound,
    /// 进入后通知 `entered`，等到 `release` 才返回 `status`
    Hold {
        entered: Arc<Notify>,
        release: Arc<Notify>,
        status: StatusResponse,
    },
}

impl Step {
    pub fn processing(progress: u32) -> Self {
        Step::Status(StatusResponse::new(JobState::Processing, progress))
    }

    pub fn completed() -> Self {
        Step::Status(StatusResponse::new(JobState::Completed, 100))
    }

    pub fn error(detail: Option<&str>) -> Self {
        let status = StatusResponse::new(JobState::Error, 0);
        Step::Status(match detail {
            Some(detail) => status.with_error(detail),
            None => status,
        })
    }

    pub fn raw(status: &str, progress: u32) -> Self {
        Step::Status(StatusResponse {
            status: status.to_string(),
            progress,
            filename: String::new(),
            error: None,
        })
    }
}

/// 卡住一次状态查询的开关
#[derive(Clone, Default)]
pub struct Gate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hold(&self, status: StatusResponse) -> Step {
        Step::Hold {
            entered: self.entered.clone(),
            release: self.release.clone(),
            status,
        }
    }
}

struct Script {
    file_id: String,
    steps: VecDeque<Step>,
}

#[derive(Default)]
struct Inner {
    scripts: HashMap<String, Script>,
    ids: HashMap<String, String>,
    failing_submits: HashSet<String>,
    results: HashMap<String, ClassificationResult>,
    remote_ids: HashSet<String>,
    submits: Vec<String>,
    status_calls: HashMap<String, usize>,
    deleted: Vec<String>,
}

/// 按文件名预先编排响应的远端客户端
///
/// 状态脚本的最后一步会被重复返回。
#[derive(Default)]
pub struct ScriptedJobClient {
    inner: Mutex<Inner>,
}

impl ScriptedJobClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// 为某个文件名指定分配的 id 和状态序列
    pub fn script(&self, filename: &str, file_id: &str, steps: Vec<Step>) {
        let mut inner = self.lock();
        inner.ids.insert(file_id.to_string(), filename.to_string());
        inner.remote_ids.insert(file_id.to_string());
        inner.scripts.insert(
            filename.to_string(),
            Script {
                file_id: file_id.to_string(),
                steps: steps.into(),
            },
        );
    }

    pub fn fail_submit(&self, filename: &str) {
        self.lock().failing_submits.insert(filename.to_string());
    }

    pub fn set_result(&self, result: ClassificationResult) {
        self.lock().results.insert(result.id.clone(), result);
    }

    /// 让结果里的 id 与任务 id 不一致
    pub fn rename_result(&self, file_id: &str, reported_id: &str) {
        if let Some(result) = self.lock().results.get_mut(file_id) {
            result.id = reported_id.to_string();
        }
    }

    pub fn submits(&self) -> Vec<String> {
        self.lock().submits.clone()
    }

    pub fn status_calls(&self, file_id: &str) -> usize {
        self.lock().status_calls.get(file_id).copied().unwrap_or(0)
    }

    pub fn deleted(&self) -> Vec<String> {
        self.lock().deleted.clone()
    }
}

#[async_trait]
impl RemoteJobClient for ScriptedJobClient {
    async fn submit(&self, file: &UploadFile) -> AppResult<UploadResponse> {
        let mut inner = self.lock();
        inner.submits.push(file.filename.clone());

        if inner.failing_submits.contains(&file.filename) {
            return Err(AppError::bad_response(
                "/upload",
                500,
                Some("storage full".to_string()),
            ));
        }

        let script = inner
            .scripts
            .get(&file.filename)
            .ok_or_else(|| AppError::bad_response("/upload", 400, Some("unscripted".to_string())))?;
        Ok(UploadResponse {
            file_id: script.file_id.clone(),
            status: "uploaded".to_string(),
            message: "File uploaded successfully".to_string(),
        })
    }

    async fn fetch_status(&self, file_id: &str) -> AppResult<StatusResponse> {
        let endpoint = format!("/upload-status/{}", file_id);
        let step = {
            let mut inner = self.lock();
            *inner.status_calls.entry(file_id.to_string()).or_default() += 1;

            let filename = inner.ids.get(file_id).cloned();
            let script = filename.and_then(|name| inner.scripts.get_mut(&name));
            let Some(script) = script else {
                return Err(AppError::not_found(endpoint, file_id));
            };
            if script.steps.len() > 1 {
                script.steps.pop_front()
            } else {
                script.steps.front().cloned()
            }
        };

        match step {
            Some(Step::Status(status)) => Ok(status),
            Some(Step::Transport) => Err(AppError::bad_response(endpoint, 502, None)),
            Some(Step::NotFound) | None => Err(AppError::not_found(endpoint, file_id)),
            Some(Step::Hold {
                entered,
                release,
                status,
            }) => {
                entered.notify_one();
                release.notified().await;
                Ok(status)
            }
        }
    }

    async fn fetch_result(&self, file_id: &str) -> AppResult<ClassificationResult> {
        self.lock()
            .results
            .get(file_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("/results/{}", file_id), file_id))
    }

    async fn delete_result(&self, file_id: &str) -> AppResult<DeleteResponse> {
        let mut inner = self.lock();
        inner.deleted.push(file_id.to_string());

        if inner.remote_ids.remove(file_id) {
            inner.results.remove(file_id);
            Ok(DeleteResponse {
                success: true,
                message: "Result deleted successfully".to_string(),
            })
        } else {
            Err(AppError::not_found(format!("/results/{}", file_id), file_id))
        }
    }
}

pub fn pdf(filename: &str) -> UploadFile {
    UploadFile::new(filename, b"%PDF-1.4 resume".to_vec())
}

pub fn sample_result(id: &str, filename: &str) -> ClassificationResult {
    ClassificationResult {
        id: id.to_string(),
        filename: filename.to_string(),
        timestamp: 1_700_000_000,
        category: "Engineering".to_string(),
        confidence: 0.87,
        text_preview: "...".to_string(),
        alternatives: None,
        full_text: None,
    }
}
