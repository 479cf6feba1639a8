use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Any transport failure or non-success status from the backend.
    #[error("request failed: {0}")]
    Request(String),
    #[error("attachment error: {0}")]
    Attachment(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("ticket saved but assignment sync failed: {0}")]
    PartialSync(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
