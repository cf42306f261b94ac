use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 文件校验失败（提交前拒绝，不会到达远端）
    #[error("文件校验失败: {0}")]
    Validation(#[from] ValidationError),
    /// 网络或远端响应错误
    #[error("传输错误: {0}")]
    Transport(#[from] TransportError),
    /// 远端不认识该 ID
    #[error("{0}")]
    NotFound(#[from] NotFoundError),
    /// 本地持久化错误
    #[error("持久化错误: {0}")]
    Persistence(#[from] PersistenceError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 文件校验错误
#[derive(Debug, Error)]
pub enum ValidationError {
    /// 不是允许的文件类型
    #[error("\"{filename}\" 不是 PDF 文件 (类型: {content_type})")]
    UnsupportedType {
        filename: String,
        content_type: String,
    },
    /// 空文件
    #[error("\"{filename}\" 是空文件")]
    EmptyFile { filename: String },
    /// 超出上传大小限制
    #[error("\"{filename}\" 大小 {size} 字节超出限制 {limit} 字节")]
    TooLarge {
        filename: String,
        size: u64,
        limit: u64,
    },
    /// 缺少文件名
    #[error("文件名不能为空")]
    MissingFilename,
}

/// 传输错误
#[derive(Debug, Error)]
pub enum TransportError {
    /// 网络请求失败
    #[error("请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: BoxError,
    },
    /// 远端返回非成功响应
    #[error("远端返回错误响应 ({endpoint}): status={status}, message={}", .message.as_deref().unwrap_or("<无>"))]
    BadResponse {
        endpoint: String,
        status: u16,
        message: Option<String>,
    },
    /// 响应 JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        #[source]
        source: BoxError,
    },
    /// 请求构建失败
    #[error("无法构建请求 ({endpoint}): {source}")]
    InvalidRequest {
        endpoint: String,
        #[source]
        source: BoxError,
    },
}

/// 远端不存在该 ID
#[derive(Debug, Error)]
#[error("远端不存在 ({endpoint}): {file_id}")]
pub struct NotFoundError {
    pub endpoint: String,
    pub file_id: String,
}

/// 本地持久化错误
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// 读取快照失败
    #[error("读取快照失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入快照失败
    #[error("写入快照失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 快照内容无法解析
    #[error("快照内容损坏 (key: {key}): {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建网络请求失败错误
    pub fn request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Transport(TransportError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建非成功响应错误
    pub fn bad_response(endpoint: impl Into<String>, status: u16, message: Option<String>) -> Self {
        AppError::Transport(TransportError::BadResponse {
            endpoint: endpoint.into(),
            status,
            message,
        })
    }

    /// 创建 JSON 解析错误
    pub fn json_parse_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Transport(TransportError::JsonParseFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建远端不存在错误
    pub fn not_found(endpoint: impl Into<String>, file_id: impl Into<String>) -> Self {
        AppError::NotFound(NotFoundError {
            endpoint: endpoint.into(),
            file_id: file_id.into(),
        })
    }

    /// 是否为远端不存在
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    /// 是否为传输错误
    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Transport(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
