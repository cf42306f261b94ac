//! 上传编排器 - 编排层
//!
//! ## 职责
//!
//! 1. **批量提交**：逐个校验、上传文件，为每个成功上传的文件启动 JobTracker
//! 2. **事件汇总**：唯一的事件泵把 Completed 写入结果仓库，把 Failed 写入错误日志
//! 3. **跟踪器登记**：file_id → 取消令牌，停止后的事件一律丢弃
//! 4. **删除结果**：远端删除不论成败，本地删除都会执行
//!
//! 所有对结果仓库和错误日志的修改都在事件泵里顺序执行。

use crate::clients::RemoteJobClient;
use crate::models::{ClassificationResult, FileValidator, Job, UploadFile};
use crate::services::ResultStore;
use crate::workflow::{
    job_event_channel, JobEvent, JobEventReceiver, JobEventSender, JobHandle, JobTracker,
};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// 一次批量提交的汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSubmission {
    /// 成功上传的 file_id，按提交顺序
    pub submitted: Vec<String>,
    /// 校验未通过的文件数
    pub rejected: usize,
    /// 上传失败或因关闭未跟踪的文件数
    pub failed: usize,
}

impl BatchSubmission {
    pub fn total(&self) -> usize {
        self.submitted.len() + self.rejected + self.failed
    }
}

/// 正在跟踪的任务
struct ActiveJob {
    job: Job,
    handle: JobHandle,
    task: Option<JoinHandle<()>>,
}

/// 编排器内部状态，只在持锁时修改
struct OrchestratorState {
    store: ResultStore,
    active: HashMap<String, ActiveJob>,
    errors: Vec<String>,
    active_tx: watch::Sender<usize>,
}

impl OrchestratorState {
    fn publish_active(&self) {
        self.active_tx.send_replace(self.active.len());
    }

    fn record_error(&mut self, message: String) {
        error!("❌ {}", message);
        self.errors.push(message);
    }

    /// 应用一个跟踪器事件
    fn apply(&mut self, event: JobEvent) {
        let file_id = event.file_id().to_string();
        let Some(active) = self.active.get_mut(&file_id) else {
            debug!("任务 #{} 未登记或已移除，丢弃事件", file_id);
            return;
        };
        if active.handle.is_stopped() {
            debug!("任务 #{} 已停止，丢弃事件", file_id);
            return;
        }

        match event {
            JobEvent::Progress(job) => {
                active.job = job;
            }
            JobEvent::Completed { job, result } => {
                debug!("{} 处理完成，写入结果仓库", job);
                self.store.insert(result);
                self.active.remove(&file_id);
                self.publish_active();
            }
            JobEvent::Failed { job, message } => {
                debug!("{} 处理失败", job);
                self.record_error(message);
                self.active.remove(&file_id);
                self.publish_active();
            }
        }
    }
}

/// 上传编排器
///
/// 职责：
/// - 持有结果仓库、错误日志与所有活动跟踪器
/// - 一个文件失败不影响同批的其他文件
/// - 被 drop 时停止所有跟踪器
pub struct Orchestrator {
    client: Arc<dyn RemoteJobClient>,
    validator: FileValidator,
    poll_interval: Duration,
    state: Arc<Mutex<OrchestratorState>>,
    events: JobEventSender,
    active_rx: watch::Receiver<usize>,
    shutdown: CancellationToken,
    pump: JoinHandle<()>,
}

impl Orchestrator {
    /// 创建编排器并启动事件泵
    ///
    /// 需要在 tokio 运行时内调用。
    pub fn new(
        client: Arc<dyn RemoteJobClient>,
        store: ResultStore,
        validator: FileValidator,
        poll_interval: Duration,
    ) -> Self {
        let (active_tx, active_rx) = watch::channel(0);
        let state = Arc::new(Mutex::new(OrchestratorState {
            store,
            active: HashMap::new(),
            errors: Vec::new(),
            active_tx,
        }));
        let (events, receiver) = job_event_channel();
        let pump = tokio::spawn(run_event_pump(state.clone(), receiver));

        Self {
            client,
            validator,
            poll_interval,
            state,
            events,
            active_rx,
            shutdown: CancellationToken::new(),
            pump,
        }
    }

    // ========== 提交 ==========

    /// 批量提交文件
    ///
    /// 按顺序逐个处理；校验失败或上传失败只记录错误，继续处理后面的文件。
    /// 关闭之后提交的文件不会上传，逐个记入错误日志。
    pub async fn submit_batch(&self, files: Vec<UploadFile>) -> BatchSubmission {
        let mut summary = BatchSubmission::default();

        for file in files {
            if self.shutdown.is_cancelled() {
                let message = format!("编排器已关闭，未上传 {}", file.filename);
                self.state.lock().await.record_error(message);
                summary.failed += 1;
                continue;
            }

            if let Err(e) = self.validator.validate(&file) {
                warn!("⚠️ 跳过文件: {}", e);
                self.state.lock().await.record_error(e.to_string());
                summary.rejected += 1;
                continue;
            }

            let tracker = match JobTracker::submit(
                self.client.clone(),
                &file,
                self.events.clone(),
                self.poll_interval,
            )
            .await
            {
                Ok(tracker) => tracker.with_cancellation(self.shutdown.child_token()),
                Err(e) => {
                    let message = format!("上传 {} 失败: {}", file.filename, e);
                    self.state.lock().await.record_error(message);
                    summary.failed += 1;
                    continue;
                }
            };

            let file_id = tracker.job().file_id.clone();
            if self.shutdown.is_cancelled() {
                // 上传期间被关闭：远端已有任务，但不再跟踪
                let message = format!("{} 上传后编排器已关闭，不再跟踪", tracker.job());
                self.state.lock().await.record_error(message);
                summary.failed += 1;
                continue;
            }
            self.register(tracker).await;
            summary.submitted.push(file_id);
        }

        info!(
            "📦 本批提交完成: 成功 {} / 校验失败 {} / 上传失败 {}",
            summary.submitted.len(),
            summary.rejected,
            summary.failed
        );
        summary
    }

    /// 登记并启动跟踪器
    async fn register(&self, tracker: JobTracker) {
        let mut state = self.state.lock().await;
        let file_id = tracker.job().file_id.clone();
        let job = tracker.job().clone();
        let handle = tracker.handle();

        if let Some(previous) = state.active.remove(&file_id) {
            warn!("{} 已在跟踪中，停止旧的跟踪器", previous.job);
            previous.handle.stop();
        }

        // 持锁期间启动，事件泵一定先看到登记
        let task = tracker.spawn();
        state.active.insert(
            file_id,
            ActiveJob {
                job,
                handle,
                task: Some(task),
            },
        );
        state.publish_active();
    }

    // ========== 删除 ==========

    /// 删除一条结果
    ///
    /// 远端删除失败（包括不存在）不影响本地删除。
    ///
    /// # 返回
    /// 本地是否真的删除了一条结果
    pub async fn delete_result(&self, id: &str) -> bool {
        match self.client.delete_result(id).await {
            Ok(response) => debug!("远端删除 {}: {}", id, response.message),
            Err(e) if e.is_not_found() => debug!("远端不存在 {}，继续本地删除", id),
            Err(e) => warn!("⚠️ 远端删除 {} 失败，继续本地删除: {}", id, e),
        }

        self.state.lock().await.store.delete(id)
    }

    // ========== 查询 ==========

    /// 当前全部结果，按插入顺序
    pub async fn snapshot(&self) -> Vec<ClassificationResult> {
        self.state.lock().await.store.snapshot()
    }

    /// 活动任务的最新进度
    pub async fn active_progress(&self) -> HashMap<String, Job> {
        self.state
            .lock()
            .await
            .active
            .iter()
            .map(|(id, active)| (id.clone(), active.job.clone()))
            .collect()
    }

    pub async fn error_log(&self) -> Vec<String> {
        self.state.lock().await.errors.clone()
    }

    pub async fn clear_errors(&self) {
        self.state.lock().await.errors.clear();
    }

    /// 活动任务数
    pub fn active_count(&self) -> usize {
        *self.active_rx.borrow()
    }

    // ========== 停止 ==========

    /// 停止跟踪某个任务，之后该任务不会再产生任何修改
    ///
    /// # 返回
    /// 该任务是否处于活动状态
    pub async fn stop_job(&self, file_id: &str) -> bool {
        let mut state = self.state.lock().await;
        let Some(active) = state.active.remove(file_id) else {
            return false;
        };
        active.handle.stop();
        info!("{} ⏹️ 已停止跟踪", active.job);
        state.publish_active();
        true
    }

    /// 停止所有跟踪器并等待它们退出
    pub async fn shutdown(&self) {
        self.shutdown.cancel();

        let tasks: Vec<_> = {
            let mut state = self.state.lock().await;
            let tasks = state
                .active
                .drain()
                .filter_map(|(_, mut active)| {
                    active.handle.stop();
                    active.task.take()
                })
                .collect::<Vec<_>>();
            state.publish_active();
            tasks
        };

        let count = tasks.len();
        for joined in join_all(tasks).await {
            if let Err(e) = joined {
                warn!("⚠️ 跟踪任务异常退出: {}", e);
            }
        }
        info!("✓ 已停止 {} 个跟踪器", count);
    }

    /// 等待所有活动任务结束
    pub async fn wait_until_idle(&self) {
        let mut rx = self.active_rx.clone();
        if rx.wait_for(|active| *active == 0).await.is_err() {
            debug!("活动计数通道已关闭");
        }
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.shutdown.cancel();
        self.pump.abort();
    }
}

/// 事件泵：顺序应用所有跟踪器事件
async fn run_event_pump(state: Arc<Mutex<OrchestratorState>>, mut receiver: JobEventReceiver) {
    while let Some(event) = receiver.recv().await {
        state.lock().await.apply(event);
    }
    debug!("事件通道已关闭，事件泵退出");
}
