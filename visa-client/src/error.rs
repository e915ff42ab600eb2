//! Client Error Types
//!
//! Every failure at the network boundary is classified here so the caller
//! can turn it into a single user-visible notification.

use std::time::Duration;
use thiserror::Error;
use visa_core::{ValidationErrors, VisaError};

use crate::detail::ApiDetail;

/// Client result type
pub type ClientResult<T> = Result<T, ClientError>;

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Client-local validation failed; nothing was sent
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Local lifecycle or domain rule rejected the operation
    #[error(transparent)]
    Core(#[from] VisaError),

    /// 401 on an anonymous call (bad credentials)
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// 401 after the single refresh attempt; credentials were cleared
    #[error("Session expired")]
    SessionExpired,

    /// 403
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// 404
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// 422 with field details
    #[error("Request rejected: {message}")]
    Unprocessable { message: String, fields: ValidationErrors },

    /// 429
    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    /// 5xx
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Any other non-2xx status (400, 409, ...)
    #[error("API request failed: {status} - {message}")]
    Api { status: u16, message: String },

    /// No response received
    #[error("Network error: {message}")]
    Network { message: String },

    /// Response body could not be decoded
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Background job reported failure
    #[error("Job failed: {message}")]
    JobFailed { message: String },

    /// Polling window elapsed before completion
    #[error("Polling gave up after {seconds}s")]
    PollTimeout { seconds: u64 },

    /// Owning task was torn down
    #[error("Operation cancelled")]
    Cancelled,

    /// Same action already running for this case
    #[error("Action {action} already in progress")]
    ActionInFlight { action: String },

    /// Not signed in
    #[error("Not signed in")]
    NotSignedIn,

    /// Credential store failure
    #[error("Credential store error: {message}")]
    Storage { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ClientError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Classify a non-2xx response
    pub fn from_status(status: u16, detail: Option<ApiDetail>, retry_after: Option<Duration>) -> Self {
        let message = detail
            .as_ref()
            .map(ApiDetail::flatten)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| default_message(status).to_string());

        match status {
            401 => Self::Unauthorized { message },
            403 => Self::Forbidden { message },
            404 => Self::NotFound { message },
            422 => Self::Unprocessable {
                fields: detail.map(|d| d.field_errors()).unwrap_or_default(),
                message,
            },
            429 => Self::RateLimited { message, retry_after },
            500..=599 => Self::Server { status, message },
            _ => Self::Api { status, message },
        }
    }

    /// HTTP status behind this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } | Self::SessionExpired => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::Unprocessable { .. } => Some(422),
            Self::RateLimited { .. } => Some(429),
            Self::Server { status, .. } | Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether an idempotent request failing this way may be retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Server { .. })
    }

    /// Whether the user has to sign in again
    pub fn requires_sign_in(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::NotSignedIn)
    }

    /// Localized toast text
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(_) => "请检查表单中标记的字段".to_string(),
            Self::Core(e) => match e {
                VisaError::InvalidTransition { .. } | VisaError::TerminalStatus { .. } => {
                    "当前状态下无法执行该操作".to_string()
                }
                VisaError::GuardRejected { reason, .. } => format!("操作条件未满足：{}", reason),
                VisaError::LinkNotUsable { .. } => "链接已失效".to_string(),
                VisaError::FileTooLarge { .. } => "文件过大".to_string(),
                VisaError::UnsupportedFileType { .. } => "不支持的文件格式".to_string(),
                VisaError::EmptyFile { .. } => "文件为空".to_string(),
                other => other.to_string(),
            },
            Self::Unauthorized { message } => message.clone(),
            Self::SessionExpired | Self::NotSignedIn => "登录已过期，请重新登录".to_string(),
            Self::Forbidden { .. } => "没有权限执行该操作".to_string(),
            Self::NotFound { .. } => "请求的资源不存在".to_string(),
            Self::Unprocessable { message, .. } => message.clone(),
            Self::RateLimited { .. } => "请求过于频繁，请稍后再试".to_string(),
            Self::Server { .. } => "服务器错误，请稍后再试".to_string(),
            Self::Api { message, .. } => message.clone(),
            Self::Network { .. } => "网络连接失败，请检查网络".to_string(),
            Self::Decode { .. } => "服务器响应格式错误".to_string(),
            Self::JobFailed { message } => format!("处理失败：{}", message),
            Self::PollTimeout { .. } => "处理时间过长，请稍后刷新查看".to_string(),
            Self::Cancelled => "操作已取消".to_string(),
            Self::ActionInFlight { .. } => "操作进行中，请勿重复提交".to_string(),
            Self::Storage { .. } | Self::Config { .. } => self.to_string(),
        }
    }
}

fn default_message(status: u16) -> &'static str {
    match status {
        400 => "请求参数错误",
        401 => "用户名或密码错误",
        403 => "没有权限执行该操作",
        404 => "请求的资源不存在",
        409 => "当前状态下无法执行该操作",
        422 => "提交的数据无效",
        429 => "请求过于频繁，请稍后再试",
        500..=599 => "服务器错误，请稍后再试",
        _ => "请求失败",
    }
}

impl From<ValidationErrors> for ClientError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::decode(e.to_string())
        } else {
            Self::network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::decode(e.to_string())
    }
}
