//! Error types for costlens-core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed record in bucket {bucket}: {reason}")]
    MalformedRecord { bucket: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub fn malformed(bucket: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedRecord {
            bucket: bucket.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error invalidates the batch it was raised for
    pub fn is_malformed_record(&self) -> bool {
        matches!(self, Error::MalformedRecord { .. })
    }
}

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
