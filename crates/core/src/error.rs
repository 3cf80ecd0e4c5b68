use markscope_api::BoxError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkscopeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("MessagePack encode error: {0}")]
    MessagePackEncode(#[from] rmp_serde::encode::Error),
    #[error("MessagePack decode error: {0}")]
    MessagePackDecode(#[from] rmp_serde::decode::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Parsing error: {0}")]
    Parsing(String),
    #[error("Unsupported cache format for {}: expected .json or .msgpack", .0.display())]
    UnsupportedCacheFormat(PathBuf),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<BoxError> for MarkscopeError {
    fn from(err: BoxError) -> Self {
        MarkscopeError::Parsing(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MarkscopeError>;
