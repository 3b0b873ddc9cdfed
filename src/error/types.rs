//! Error types
//!
//! Defines domain-specific error types for each stage of a gateway operation.

use std::fmt;
use std::io;

/// Content decoding errors
#[derive(Debug)]
pub enum DecodeError {
    InvalidEncoding(String),
    FetchFailed(String),
    MissingContent,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidEncoding(e) => write!(f, "InvalidEncoding: {}", e),
            DecodeError::FetchFailed(e) => write!(f, "FetchFailed: {}", e),
            DecodeError::MissingContent => write!(f, "MissingContent: no inline content or remote url"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Storage module errors
#[derive(Debug)]
pub enum StorageError {
    DirectoryMissing(String),
    Forbidden(String),
    NotFound(String),
    InvalidPath(String),
    IoError(io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::DirectoryMissing(p) => write!(f, "DirectoryMissing: {}", p),
            StorageError::Forbidden(p) => write!(f, "Forbidden: {}", p),
            StorageError::NotFound(p) => write!(f, "NotFound: {}", p),
            StorageError::InvalidPath(p) => write!(f, "InvalidPath: {}", p),
            StorageError::IoError(e) => write!(f, "IOError: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        StorageError::IoError(error)
    }
}

/// Any failure surfaced by a gateway operation
#[derive(Debug)]
pub enum GatewayError {
    InvalidRequest(String),
    Decode(DecodeError),
    Storage(StorageError),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::InvalidRequest(e) => write!(f, "InvalidRequest: {}", e),
            GatewayError::Decode(e) => write!(f, "{}", e),
            GatewayError::Storage(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<DecodeError> for GatewayError {
    fn from(error: DecodeError) -> Self {
        GatewayError::Decode(error)
    }
}

impl From<StorageError> for GatewayError {
    fn from(error: StorageError) -> Self {
        GatewayError::Storage(error)
    }
}

impl From<io::Error> for GatewayError {
    fn from(error: io::Error) -> Self {
        GatewayError::Storage(StorageError::IoError(error))
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
