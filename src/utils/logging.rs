use crate::error::{AppResult, PersistenceError};
/// 日志工具模块
///
/// 提供日志初始化、格式化输出和错误报告的辅助函数
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info。
/// 重复初始化时静默忽略。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `api_base_url`: 远端服务地址
/// - `poll_interval_ms`: 轮询间隔
pub fn log_startup(api_base_url: &str, poll_interval_ms: u64) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 简历上传分类");
    info!("🌐 服务地址: {}", api_base_url);
    info!("⏱️ 轮询间隔: {} ms", poll_interval_ms);
    info!("{}", "=".repeat(60));
}

/// 记录文件加载信息
pub fn log_files_loaded(total: usize) {
    info!("✓ 找到 {} 个待上传的文件", total);
    info!("💡 所有文件上传后并发轮询处理进度\n");
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量
/// - `total`: 总数
/// - `log_file_path`: 错误报告路径，没有错误时为 None
pub fn print_final_stats(success: usize, failed: usize, total: usize, log_file_path: Option<&str>) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    if let Some(path) = log_file_path {
        info!("\n错误报告已保存至: {}", path);
    }
}

/// 写出错误报告
///
/// # 参数
/// - `log_file_path`: 报告路径（整份覆盖）
/// - `errors`: 错误日志
pub fn write_error_report(log_file_path: &str, errors: &[String]) -> AppResult<()> {
    let mut report = format!(
        "{}\n上传错误报告 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    for (idx, message) in errors.iter().enumerate() {
        report.push_str(&format!("{}. {}\n", idx + 1, message));
    }

    fs::write(log_file_path, report).map_err(|source| PersistenceError::WriteFailed {
        path: log_file_path.to_string(),
        source,
    })?;
    Ok(())
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
