//! 批量上传处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是命令行的入口，负责组装各层并驱动一次完整的批量上传。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：创建 HTTP 客户端、快照存储、结果仓库和编排器
//! 2. **批量加载**：从路径加载所有待上传的文件（`Vec<UploadFile>`）
//! 3. **进度输出**：每个轮询间隔输出一次活动任务进度
//! 4. **结果管理**：列出、排序、删除已保存的结果
//! 5. **全局统计**：汇总成功/失败数量并写出错误报告
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个任务的细节，委托给 `Orchestrator`
//! - **资源所有者**：唯一持有编排器的模块

use crate::clients::HttpJobClient;
use crate::config::Config;
use crate::infrastructure::FileSnapshotStorage;
use crate::models::{load_upload_files, ClassificationResult, FileValidator, ResultOrder};
use crate::orchestrator::Orchestrator;
use crate::services::ResultStore;
use crate::utils::logging;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    orchestrator: Orchestrator,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config.api_base_url, config.poll_interval_ms);

        let client = Arc::new(HttpJobClient::new(&config));
        let storage = Arc::new(FileSnapshotStorage::new(&config.data_dir));
        let store = ResultStore::open(storage, config.storage_key.clone());
        let orchestrator = Orchestrator::new(
            client,
            store,
            FileValidator::from_config(&config),
            config.poll_interval(),
        );

        Ok(Self {
            config,
            orchestrator,
        })
    }

    /// 上传文件并等待全部处理结束
    pub async fn run_submit(&self, paths: &[PathBuf]) -> Result<()> {
        info!("\n📁 正在扫描待上传的文件...");
        let files = load_upload_files(paths).await?;

        if files.is_empty() {
            warn!("⚠️ 没有找到待上传的文件，程序结束");
            return Ok(());
        }
        logging::log_files_loaded(files.len());

        let before = self.orchestrator.snapshot().await.len();
        let submission = self.orchestrator.submit_batch(files).await;
        self.wait_with_progress().await;

        let saved = self.orchestrator.snapshot().await.len().saturating_sub(before);
        let errors = self.orchestrator.error_log().await;

        let report_path = if errors.is_empty() {
            None
        } else {
            logging::write_error_report(&self.config.output_log_file, &errors)?;
            Some(self.config.output_log_file.as_str())
        };
        logging::print_final_stats(saved, errors.len(), submission.total(), report_path);

        Ok(())
    }

    /// 等待所有任务结束，期间每个轮询间隔输出一次进度
    async fn wait_with_progress(&self) {
        let interval = self.config.poll_interval();
        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.orchestrator.wait_until_idle() => break,
                _ = ticker.tick() => self.log_progress().await,
            }
        }
    }

    async fn log_progress(&self) {
        let mut jobs: Vec<_> = self.orchestrator.active_progress().await.into_values().collect();
        jobs.sort_by(|a, b| a.filename.cmp(&b.filename));

        info!("{}", "─".repeat(60));
        for job in jobs {
            info!("{} {} {}%", job, job.state, job.progress);
        }
    }

    /// 列出已保存的结果
    pub async fn list(&self, order: ResultOrder) -> Vec<ClassificationResult> {
        let mut results = self.orchestrator.snapshot().await;
        order.sort(&mut results);

        info!("{}", "=".repeat(60));
        info!("📋 已保存 {} 条分类结果", results.len());
        info!("{}", "=".repeat(60));
        for result in &results {
            let time = chrono::DateTime::from_timestamp(result.timestamp, 0)
                .map(|t| {
                    t.with_timezone(&chrono::Local)
                        .format("%Y-%m-%d %H:%M:%S")
                        .to_string()
                })
                .unwrap_or_else(|| result.timestamp.to_string());
            info!(
                "#{} {} → {} ({:.0}%) {}",
                result.id,
                result.filename,
                result.category,
                result.confidence * 100.0,
                time
            );
            if !result.text_preview.is_empty() {
                info!("    {}", logging::truncate_text(&result.text_preview, 80));
            }
        }
        results
    }

    /// 删除结果
    ///
    /// # 返回
    /// 本地实际删除的条数
    pub async fn delete(&self, ids: &[String]) -> usize {
        let mut removed = 0;
        for id in ids {
            if self.orchestrator.delete_result(id).await {
                removed += 1;
            } else {
                warn!("⚠️ 本地没有结果 {}", id);
            }
        }
        info!("✓ 已删除 {}/{} 条结果", removed, ids.len());
        removed
    }

    /// 停止所有跟踪器
    pub async fn shutdown(&self) {
        self.orchestrator.shutdown().await;
    }
}
