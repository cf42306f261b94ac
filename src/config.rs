use crate::error::{AppResult, ConfigError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "RESUME_UPLOAD_CONFIG";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 远端任务服务地址
    pub api_base_url: String,
    /// 轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 结果快照存放目录
    pub data_dir: String,
    /// 快照键名
    pub storage_key: String,
    /// 单个文件上传大小上限（字节）
    pub max_upload_bytes: u64,
    /// 允许上传的扩展名
    pub allowed_extensions: Vec<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 错误报告输出文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            poll_interval_ms: 1000,
            data_dir: ".resume_results".to_string(),
            storage_key: "resumeClassificationResults".to_string(),
            max_upload_bytes: 16 * 1024 * 1024,
            allowed_extensions: vec!["pdf".to_string()],
            verbose_logging: false,
            output_log_file: "upload_errors.txt".to_string(),
        }
    }
}

impl Config {
    /// 从 TOML 文件加载，缺失的字段取默认值
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })?;
        Ok(config)
    }

    /// 默认配置 + 环境变量覆盖
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 配置文件（若存在）+ 环境变量覆盖
    pub fn load() -> AppResult<Self> {
        let explicit = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        let base = match explicit {
            Some(path) => Self::from_file(path)?,
            None if Path::new("config.toml").exists() => Self::from_file("config.toml")?,
            None => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    fn with_env_overrides(self) -> Self {
        Self {
            api_base_url: std::env::var("API_BASE_URL").unwrap_or(self.api_base_url),
            poll_interval_ms: std::env::var("POLL_INTERVAL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.poll_interval_ms),
            data_dir: std::env::var("DATA_DIR").unwrap_or(self.data_dir),
            storage_key: std::env::var("STORAGE_KEY").unwrap_or(self.storage_key),
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES").ok().and_then(|v| v.parse().ok()).unwrap_or(self.max_upload_bytes),
            allowed_extensions: self.allowed_extensions,
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
        }
    }

    /// 轮询间隔
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
