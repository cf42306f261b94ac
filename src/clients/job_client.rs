/// 远端任务服务客户端
///
/// 封装上传、查询状态、拉取结果、删除结果四个调用，不保存任何状态
use crate::config::Config;
use crate::error::{AppError, AppResult, TransportError};
use crate::models::{ClassificationResult, DeleteResponse, StatusResponse, UploadFile, UploadResponse};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// 远端任务服务
///
/// 每次调用都是一次独立的请求/响应。远端不会对重复上传去重，
/// 每次 `submit` 都会得到新的 `file_id`。
#[async_trait]
pub trait RemoteJobClient: Send + Sync {
    /// `POST /upload`
    async fn submit(&self, file: &UploadFile) -> AppResult<UploadResponse>;

    /// `GET /upload-status/{file_id}`
    async fn fetch_status(&self, file_id: &str) -> AppResult<StatusResponse>;

    /// `GET /results/{file_id}`，只应在状态为 completed 后调用
    async fn fetch_result(&self, file_id: &str) -> AppResult<ClassificationResult>;

    /// `DELETE /results/{file_id}`，id 不存在时返回 NotFound
    async fn delete_result(&self, file_id: &str) -> AppResult<DeleteResponse>;
}

/// 基于 HTTP 的任务服务客户端
#[derive(Clone)]
pub struct HttpJobClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpJobClient {
    /// 创建新的客户端
    pub fn new(config: &Config) -> Self {
        Self::with_base_url(&config.api_base_url)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// 检查响应状态并解析 JSON
    ///
    /// 404 → NotFound；其他非 2xx → BadResponse，错误信息取自响应体的 `error` 字段
    async fn parse_response<T: DeserializeOwned>(
        endpoint: &str,
        file_id: Option<&str>,
        response: Response,
    ) -> AppResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::request_failed(endpoint, e))?;

        debug!("{} → {} ({} 字节)", endpoint, status, body.len());

        if status == StatusCode::NOT_FOUND {
            if let Some(file_id) = file_id {
                return Err(AppError::not_found(endpoint, file_id));
            }
        }

        if !status.is_success() {
            return Err(AppError::bad_response(
                endpoint,
                status.as_u16(),
                Self::extract_error_message(&body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| AppError::json_parse_failed(endpoint, e))
    }

    /// 提取错误响应中的 `error` 字段
    pub fn extract_error_message(body: &str) -> Option<String> {
        serde_json::from_str::<Value>(body)
            .ok()?
            .get("error")
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

#[async_trait]
impl RemoteJobClient for HttpJobClient {
    async fn submit(&self, file: &UploadFile) -> AppResult<UploadResponse> {
        let endpoint = self.endpoint("upload");

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.filename.clone())
            .mime_str(&file.content_type)
            .map_err(|e| {
                AppError::Transport(TransportError::InvalidRequest {
                    endpoint: endpoint.clone(),
                    source: Box::new(e),
                })
            })?;
        let form = Form::new().part("file", part);

        debug!("上传文件: {} ({} 字节)", file.filename, file.size());

        let response = self
            .http
            .post(&endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::request_failed(&endpoint, e))?;

        Self::parse_response(&endpoint, None, response).await
    }

    async fn fetch_status(&self, file_id: &str) -> AppResult<StatusResponse> {
        let endpoint = self.endpoint(&format!("upload-status/{}", file_id));
        let response = self
            .http
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| AppError::request_failed(&endpoint, e))?;

        Self::parse_response(&endpoint, Some(file_id), response).await
    }

    async fn fetch_result(&self, file_id: &str) -> AppResult<ClassificationResult> {
        let endpoint = self.endpoint(&format!("results/{}", file_id));
        let response = self
            .http
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| AppError::request_failed(&endpoint, e))?;

        Self::parse_response(&endpoint, Some(file_id), response).await
    }

    async fn delete_result(&self, file_id: &str) -> AppResult<DeleteResponse> {
        let endpoint = self.endpoint(&format!("results/{}", file_id));
        let response = self
            .http
            .delete(&endpoint)
            .send()
            .await
            .map_err(|e| AppError::request_failed(&endpoint, e))?;

        Self::parse_response(&endpoint, Some(file_id), response).await
    }
}
