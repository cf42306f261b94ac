//! # Resume Upload
//!
//! 一个用于批量上传简历并轮询分类结果的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（本地持久化存储），只暴露能力
//! - `SnapshotStorage` - 按键读写整份快照
//!
//! ### ② 业务能力层（Services / Clients）
//! - `clients/` - `RemoteJobClient`：上传、查询状态、拉取结果、删除结果
//! - `services/` - `ResultStore`：按 id 去重保存分类结果，每次变更后持久化
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个文件"的完整处理流程
//! - `JobTracker` - 轮询状态机（uploaded → processing → completed / error）
//! - `JobEvent` - 跟踪器向编排层汇报的事件
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/upload_orchestrator` - 管理所有跟踪器，汇总结果与错误
//! - `orchestrator/batch_processor` - 命令行入口，加载文件并输出统计
//!
//! ## 模块结构

pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{HttpJobClient, RemoteJobClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{FileSnapshotStorage, MemorySnapshotStorage, SnapshotStorage};
pub use models::{ClassificationResult, FileValidator, Job, JobState, ResultOrder, UploadFile};
pub use orchestrator::{App, BatchSubmission, Orchestrator};
pub use services::ResultStore;
pub use workflow::{JobEvent, JobHandle, JobTracker};
