use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreErrorCode {
    NotFound,
    Validation,
    Unavailable,
    Internal,
}

/// Structured failure a store pushes over the watch channel or returns from
/// a mutation endpoint.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{code:?}: {message}")]
pub struct StoreError {
    pub code: StoreErrorCode,
    pub message: String,
}

impl StoreError {
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Rejections raised while normalizing a create draft, before anything is
/// forwarded to the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("event title must not be empty")]
    EmptyTitle,
    #[error("event date must not be empty")]
    EmptyDate,
    #[error("event time must not be empty")]
    EmptyTime,
    #[error("invalid event date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("invalid event time '{0}': expected 24h HH:MM")]
    InvalidTime(String),
}
