//! Error types for GradeVault
//!
//! Provides a unified error type hierarchy for the entire system.

use thiserror::Error;

/// Result type alias using GradeVault's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for GradeVault
#[derive(Error, Debug)]
pub enum Error {
    // Query compilation errors
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    // Authentication/Authorization errors
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    // Field encryption errors
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Query-compilation errors
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Table not in allow-list: {0}")]
    InvalidTarget(String),

    #[error("Empty conditions are not allowed for {0}")]
    EmptyConditions(&'static str),

    #[error("Malformed descriptor: {0}")]
    MalformedDescriptor(String),
}

/// Storage-layer errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Duplicate record: {0}")]
    DuplicateRecord(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
}

/// Authentication/Authorization errors
#[derive(Error, Debug)]
pub enum AuthError {
    // One kind for every token failure: signature, expiry, malformed.
    // Callers must not learn which check rejected them.
    #[error("Invalid token")]
    InvalidToken,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
}

/// Field-encryption errors
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid key length: {0} bytes, must be 16/24/32")]
    InvalidKey(usize),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
