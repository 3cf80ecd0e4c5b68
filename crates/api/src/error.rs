#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unknown discovery domain: {0}")]
    UnknownDomain(String),
    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),
    #[error("Invalid listener spec: {0}")]
    InvalidListenerSpec(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
