use std::io;

use thiserror::Error;

pub type InterruptResult<T> = Result<T, InterruptError>;

#[derive(Debug, Error)]
pub enum InterruptError {
    #[error("{0}")]
    Message(String),

    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Regex(#[from] regex::Error),

    #[error("dotenv: {0}")]
    Dotenv(#[from] dotenv::Error),

    #[error("invalid value for {key}: {value:?}")]
    Config { key: &'static str, value: String },
}

impl From<&str> for InterruptError {
    fn from(msg: &str) -> Self {
        Self::Message(msg.to_string())
    }
}
