//! Error types for rabbitmq-zabbix
//!
//! This module defines the error types used throughout the application.

use thiserror::Error;

/// Management API 클라이언트 에러 타입
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP 클라이언트 초기화 실패
    #[error("Failed to initialize HTTP client: {0}")]
    HttpClientInit(#[source] reqwest::Error),

    /// 잘못된 API URL
    #[error("Invalid API URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// 네트워크 전송 실패 (연결 거부, DNS, TLS, 응답 읽기)
    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// 리소스 없음 (HTTP 404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// 그 외 HTTP 상태 코드 에러
    #[error("HTTP error status {status} for {path}")]
    Status { status: u16, path: String },

    /// JSON 파싱 에러
    #[error("JSON parse error for {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// HTTP 상태 코드 추출
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound(_) => Some(404),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 404 응답인지 확인
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

/// Filter JSON errors
#[derive(Error, Debug)]
pub enum FilterError {
    /// The filter argument is not valid JSON
    #[error("Invalid filters object: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A filter element is not a JSON object
    #[error("Invalid filters object: element {index} is {found}, expected an object")]
    NotAnObject { index: usize, found: &'static str },
}

/// Sender adapter errors
#[derive(Error, Debug)]
pub enum SenderError {
    /// Creating or writing the temporary data file failed
    #[error("Failed to write sender data file: {0}")]
    DataFile(#[source] std::io::Error),

    /// The sender executable could not be started
    #[error("Failed to run sender '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },
}

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Management API error
    #[error("Management API error: {0}")]
    Api(#[from] ApiError),

    /// Filter parsing error
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// Sender error
    #[error("Sender error: {0}")]
    Sender(#[from] SenderError),

    /// Command line usage error
    #[error("Usage error: {0}")]
    Usage(String),

    /// Output serialization error
    #[error("Failed to serialize output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;
