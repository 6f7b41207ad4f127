use shared::{
    domain::RecordId,
    error::{ApiException, ErrorCode},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("store rejected request with status {status}: {source}")]
    Api {
        status: u16,
        #[source]
        source: ApiException,
    },
    #[error("store rejected request with status {status}")]
    Status { status: u16 },
    #[error("record {id} not found in remote collection")]
    NotFound { id: RecordId },
    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),
    #[error("remote store is unavailable")]
    Unavailable,
}

impl StoreError {
    /// Best-effort mapping onto the store's error vocabulary. `None` means the
    /// request never produced a response (transport, config, unavailable).
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Api { source, .. } => Some(source.code),
            Self::Status { status } => code_for_status(*status),
            Self::NotFound { .. } => Some(ErrorCode::NotFound),
            Self::Transport(_) | Self::InvalidConfig(_) | Self::Unavailable => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code() == Some(ErrorCode::NotFound)
    }
}

fn code_for_status(status: u16) -> Option<ErrorCode> {
    match status {
        400 | 409 | 422 => Some(ErrorCode::Validation),
        401 => Some(ErrorCode::Unauthorized),
        403 => Some(ErrorCode::Forbidden),
        404 => Some(ErrorCode::NotFound),
        429 => Some(ErrorCode::RateLimited),
        500..=599 => Some(ErrorCode::Internal),
        _ => None,
    }
}
