//! Error types for cache operations.

use std::path::PathBuf;

/// Errors that can occur during cache operations.
///
/// Most cache operations are fail-safe: a persisted artifact that fails any
/// of these checks is a cache miss rather than a hard failure. Write errors
/// are reported to the registry, which logs them and carries on.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An artifact header is invalid (wrong magic, truncated, or corrupt).
    #[error("invalid artifact header in {path}")]
    InvalidHeader {
        /// The artifact file with the bad header.
        path: PathBuf,
    },

    /// An artifact's payload checksum does not match its header.
    #[error("checksum mismatch in {path}")]
    ChecksumMismatch {
        /// The artifact file with the mismatched checksum.
        path: PathBuf,
    },

    /// An artifact was written by an incompatible format version.
    #[error("cache format version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// The format version this build reads.
        expected: u32,
        /// The format version found on disk.
        found: u32,
    },

    /// A persisted artifact was stored under a different cache key.
    #[error("artifact in {path} was stored for a different cache key")]
    KeyMismatch {
        /// The artifact file.
        path: PathBuf,
    },

    /// Binary serialization or deserialization failed.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}
