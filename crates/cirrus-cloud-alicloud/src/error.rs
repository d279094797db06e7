//! Alibaba Cloud provider error types

use cirrus_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AliyunError {
    #[error("aliyun CLI not found. Please install: brew install aliyun-cli")]
    CliNotFound,

    #[error("aliyun command failed: {0}")]
    CommandFailed(String),

    #[error("API error [{code}]: {message}")]
    Api {
        code: String,
        message: String,
        request_id: Option<String>,
    },

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<AliyunError> for CloudError {
    fn from(err: AliyunError) -> Self {
        match err {
            AliyunError::Api {
                code,
                message,
                request_id,
            } => CloudError::Api {
                code,
                message,
                request_id,
            },
            AliyunError::CliNotFound => {
                CloudError::CommandFailed("aliyun CLI not found".to_string())
            }
            AliyunError::CommandFailed(msg) => CloudError::CommandFailed(msg),
            AliyunError::JsonError(e) => CloudError::Json(e),
            AliyunError::IoError(e) => CloudError::Io(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, AliyunError>;
