use crate::api::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("CONNECTIVITY: {0}")]
    Connectivity(String),
    #[error("VALIDATION: {0}")]
    Validation(String),
    #[error("AUTH_REQUIRED: {0}")]
    Authentication(String),
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl From<ApiError> for SyncError {
    fn from(value: ApiError) -> Self {
        match value {
            ApiError::Network(message) => Self::Connectivity(message),
            ApiError::Status { status: 401, message } | ApiError::Status { status: 403, message } => {
                Self::Authentication(message.unwrap_or_else(|| "credentials rejected".to_string()))
            }
            ApiError::Status {
                message: Some(message),
                ..
            } => Self::Validation(message),
            ApiError::Status { status, message: None } => {
                Self::Connectivity(format!("request failed with status {}", status))
            }
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(value: serde_json::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
