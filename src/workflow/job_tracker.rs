//! 任务跟踪 - 流程层
//!
//! 核心职责：定义"一个文件"从上传到终态的完整流程
//!
//! 流程顺序：
//! 1. submit → 创建 Job（Uploaded, 0%）
//! 2. 每个轮询间隔 fetch_status → 更新状态与进度
//! 3. completed → fetch_result → Completed 事件
//! 4. error / 轮询失败 / 结果拉取失败 → Failed 事件
//!
//! 被外部停止后不再发出任何事件，已经在途的响应直接丢弃。

use crate::clients::RemoteJobClient;
use crate::error::AppResult;
use crate::models::{Job, JobState, Transition, UploadFile, UNKNOWN_ERROR};
use crate::workflow::job_event::{JobEvent, JobEventSender};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// 一次轮询之后的走向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Finished,
}

/// 外部停止跟踪用的句柄，重复 stop 无副作用
#[derive(Debug, Clone)]
pub struct JobHandle {
    file_id: String,
    cancel: CancellationToken,
}

impl JobHandle {
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            debug!("停止跟踪任务 #{}", self.file_id);
        }
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// 单个文件的任务跟踪器
///
/// 职责：
/// - 独占自己的 Job，不与其他跟踪器共享状态
/// - 只通过事件通知结果，不接触结果仓库和错误日志
/// - 单次轮询失败即视为该任务失败，不做重试
pub struct JobTracker {
    job: Job,
    client: Arc<dyn RemoteJobClient>,
    events: JobEventSender,
    cancel: CancellationToken,
    poll_interval: Duration,
}

impl JobTracker {
    /// 上传文件并创建跟踪器
    ///
    /// 上传失败时不会创建任务，错误原样返回给调用方。
    pub async fn submit(
        client: Arc<dyn RemoteJobClient>,
        file: &UploadFile,
        events: JobEventSender,
        poll_interval: Duration,
    ) -> AppResult<Self> {
        let response = client.submit(file).await?;
        let job = Job::new(response.file_id, file.filename.clone());
        info!("{} 📤 上传成功: {}", job, response.message);

        Ok(Self::new(job, client, events, poll_interval))
    }

    /// 用已存在的 Job 创建跟踪器
    pub fn new(
        job: Job,
        client: Arc<dyn RemoteJobClient>,
        events: JobEventSender,
        poll_interval: Duration,
    ) -> Self {
        Self {
            job,
            client,
            events,
            cancel: CancellationToken::new(),
            poll_interval,
        }
    }

    /// 替换取消令牌（例如挂到编排器的父令牌下）
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn handle(&self) -> JobHandle {
        JobHandle {
            file_id: self.job.file_id.clone(),
            cancel: self.cancel.clone(),
        }
    }

    /// 在后台运行轮询循环
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// 轮询直到终态或被停止
    pub async fn run(mut self) {
        // 第一次查询在一个间隔之后
        let start = Instant::now() + self.poll_interval;
        let mut ticker = interval_at(start, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("{} 跟踪已停止", self.job);
                    return;
                }
                _ = ticker.tick() => {}
            }

            if self.poll_once().await == Step::Finished {
                return;
            }
        }
    }

    /// 执行一次轮询
    async fn poll_once(&mut self) -> Step {
        let file_id = self.job.file_id.clone();
        let client = self.client.clone();
        let Some(polled) = self.guarded(client.fetch_status(&file_id)).await else {
            return Step::Finished;
        };

        let status = match polled {
            Ok(status) => status,
            Err(e) => {
                error!("{} ❌ 状态查询失败，停止轮询: {}", self.job, e);
                self.job.fail(e.to_string());
                let message = format!("无法查询 {} 的处理状态: {}", self.job.filename, e);
                self.emit(JobEvent::Failed {
                    job: self.job.clone(),
                    message,
                });
                return Step::Finished;
            }
        };

        let Some(state) = JobState::from_remote(&status.status) else {
            warn!(
                "{} ⚠️ 未知的远端状态 '{}'，忽略本次结果",
                self.job, status.status
            );
            return Step::Continue;
        };

        match state {
            JobState::Uploaded | JobState::Processing => {
                if self.job.apply(state, status.progress, None) == Transition::Changed {
                    debug!("{} {} {}%", self.job, self.job.state, self.job.progress);
                    self.emit(JobEvent::Progress(self.job.clone()));
                }
                Step::Continue
            }
            JobState::Completed => self.complete(status.progress).await,
            JobState::Error => {
                self.job.apply(JobState::Error, status.progress, status.error);
                let detail = self
                    .job
                    .error_detail
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
                warn!("{} ❌ 远端处理失败: {}", self.job, detail);
                let message = format!("处理 {} 出错: {}", self.job.filename, detail);
                self.emit(JobEvent::Failed {
                    job: self.job.clone(),
                    message,
                });
                Step::Finished
            }
        }
    }

    /// 远端已完成：拉取结果后才进入 Completed
    async fn complete(&mut self, progress: u32) -> Step {
        let file_id = self.job.file_id.clone();
        let client = self.client.clone();
        let Some(fetched) = self.guarded(client.fetch_result(&file_id)).await else {
            return Step::Finished;
        };

        match fetched {
            Ok(mut result) => {
                if result.id != self.job.file_id {
                    warn!(
                        "{} 结果 id '{}' 与任务不一致，按任务 id 保存",
                        self.job, result.id
                    );
                    result.id = self.job.file_id.clone();
                }
                self.job.apply(JobState::Completed, progress, None);
                info!("{} ✅ 分类完成: {}", self.job, result.category);
                self.emit(JobEvent::Completed {
                    job: self.job.clone(),
                    result: result.normalized(),
                });
            }
            Err(e) => {
                error!("{} ❌ 拉取结果失败: {}", self.job, e);
                self.job.fail(e.to_string());
                let message = format!("无法获取 {} 的分类结果: {}", self.job.filename, e);
                self.emit(JobEvent::Failed {
                    job: self.job.clone(),
                    message,
                });
            }
        }
        Step::Finished
    }

    /// 执行一次远端调用，期间或之后被停止则返回 None
    async fn guarded<T>(&self, call: impl Future<Output = T>) -> Option<T> {
        let output = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            output = call => Some(output),
        };

        if self.cancel.is_cancelled() {
            debug!("{} 已停止，丢弃在途响应", self.job);
            return None;
        }
        output
    }

    fn emit(&self, event: JobEvent) {
        if self.events.send(event).is_err() {
            debug!("{} 事件接收方已关闭", self.job);
        }
    }
}
