//! Error types for groove-core

use thiserror::Error;

/// Reasons a control message is refused at ingestion
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("Unknown control address: {0}")]
    UnknownAddress(String),
    #[error("Wrong value type for {address}: expected {expected}")]
    WrongType {
        address: &'static str,
        expected: &'static str,
    },
    #[error("NaN value for {0}")]
    NotANumber(&'static str),
    #[error("Missing value for {0}")]
    MissingValue(&'static str),
}

pub type Result<T> = std::result::Result<T, ControlError>;
