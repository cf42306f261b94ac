//! 任务事件
//!
//! JobTracker 通过 channel 把状态变化交给编排层，自身不接触结果仓库

use crate::models::{ClassificationResult, Job};
use tokio::sync::mpsc;

/// 任务事件
#[derive(Debug, Clone)]
pub enum JobEvent {
    /// 非终态下状态或进度变化
    Progress(Job),
    /// 处理完成且结果已拉取
    Completed {
        job: Job,
        result: ClassificationResult,
    },
    /// 进入 Error（远端报错、轮询失败或结果拉取失败）
    Failed { job: Job, message: String },
}

impl JobEvent {
    pub fn job(&self) -> &Job {
        match self {
            JobEvent::Progress(job) => job,
            JobEvent::Completed { job, .. } | JobEvent::Failed { job, .. } => job,
        }
    }

    pub fn file_id(&self) -> &str {
        &self.job().file_id
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobEvent::Progress(_))
    }
}

pub type JobEventSender = mpsc::UnboundedSender<JobEvent>;
pub type JobEventReceiver = mpsc::UnboundedReceiver<JobEvent>;

/// 创建事件通道
pub fn job_event_channel() -> (JobEventSender, JobEventReceiver) {
    mpsc::unbounded_channel()
}
