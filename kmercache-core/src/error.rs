//! Error types for kmer cache operations

use std::path::PathBuf;
use thiserror::Error;

/// Storage layer errors.
///
/// Every variant is fatal for the batch that produced it: the surrounding
/// transaction is rolled back and nothing is retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Cannot open cache file {path:?}: {reason}")]
    Connection { path: PathBuf, reason: String },

    #[error("Cannot close cache file {path:?}: {reason}")]
    Close { path: PathBuf, reason: String },

    #[error("Schema error on {object}: {reason}")]
    Schema { object: String, reason: String },

    #[error("Query {query} failed for kmer {kmer}: {reason}")]
    Step {
        query: &'static str,
        kmer: String,
        reason: String,
    },

    #[error("Transaction failed: {reason}")]
    Transaction { reason: String },

    #[error("Cached payload for kmer {kmer} is not decodable: {reason}")]
    Payload { kmer: String, reason: String },
}

/// Validation errors for caller-supplied input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid kmer {kmer:?}: {reason}")]
    InvalidKmer { kmer: String, reason: String },

    #[error("Kmer {kmer} has length {got}, expected {expected}")]
    LengthMismatch {
        kmer: String,
        expected: usize,
        got: usize,
    },

    #[error("Iteration {value} is outside the supported range")]
    IterationOutOfRange { value: i64 },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("Failed to parse config TOML: {reason}")]
    Parse { reason: String },

    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Master error type for all kmer cache errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KmerCacheError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for kmer cache operations.
pub type CacheResult<T> = Result<T, KmerCacheError>;

// =============================================================================
// TESTS
// =============================================================================
