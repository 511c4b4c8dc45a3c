//! Shared error types for domain value validation

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SharedError {
    #[error("Invalid zone identity: {field} {reason}")]
    InvalidZoneIdentity { field: String, reason: String },

    #[error("Invalid version string: {input}")]
    InvalidVersion { input: String },

    #[error("Unknown node role: {input}")]
    UnknownRole { input: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
