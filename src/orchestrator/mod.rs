//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量提交和任务调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量上传处理器
//! - 管理应用生命周期（初始化、运行、清理）
//! - 从路径加载待上传文件（Vec<UploadFile>）
//! - 输出进度和全局统计信息
//!
//! ### `upload_orchestrator` - 上传编排器
//! - 为每个文件创建 JobTracker
//! - 把完成事件写入 ResultStore，把失败事件写入错误日志
//! - 登记活动任务，支持停止和等待空闲
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<UploadFile>)
//!     ↓
//! upload_orchestrator (登记 JobTracker，汇总事件)
//!     ↓
//! workflow::JobTracker (处理单个文件)
//!     ↓
//! services / clients (能力层：ResultStore / RemoteJobClient)
//!     ↓
//! infrastructure (基础设施：SnapshotStorage)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：batch_processor 管命令行流程，upload_orchestrator 管任务
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **无业务逻辑**：只做调度和统计，状态机留在 workflow

pub mod batch_processor;
pub mod upload_orchestrator;

// 重新导出主要类型
pub use batch_processor::App;
pub use upload_orchestrator::{BatchSubmission, Orchestrator};
