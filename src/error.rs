//! Domain-specific error types for the dotsync engine.
//!
//! Structured error hierarchy using [`thiserror`]. Internal modules return
//! typed errors while command handlers at the CLI boundary convert them to
//! [`anyhow::Error`] via the standard `?` operator.
//!
//! Per the engine's error policy, validation and I/O failures inside public
//! registry operations are logged and folded into a boolean result; these
//! types carry the failures that *do* cross module boundaries — most
//! importantly git failures, which stay distinct from filesystem errors so
//! the sync layer can record them in a `SyncResult` instead of aborting.

use thiserror::Error;

/// Top-level error type for the dotsync engine.
#[derive(Error, Debug)]
pub enum DotsyncError {
    /// Registry-level error (index persistence, entry lookup).
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Git operation failure, kept distinct from filesystem errors.
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    /// Platform-specific operation failure.
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

/// Errors that arise from registry index persistence and entry management.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The index file contains invalid JSON or an unexpected shape.
    #[error("Invalid registry index {path}: {message}")]
    InvalidIndex { path: String, message: String },

    /// An I/O error occurred while reading or writing the index.
    #[error("IO error on registry index {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// No entry with the given name is tracked.
    #[error("Configuration '{0}' not found")]
    NotFound(String),
}

/// Errors raised by the git client.
#[derive(Error, Debug)]
pub enum GitError {
    /// The `git` binary is not on `PATH`.
    #[error("git executable not found on PATH")]
    MissingBinary,

    /// A git invocation exited non-zero.
    #[error("git {operation} failed: {message}")]
    CommandFailed { operation: String, message: String },

    /// The path is not a git repository.
    #[error("Not a git repository: {0}")]
    NotARepository(String),
}

/// Errors that arise from platform-specific operations.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// The requested operation is not supported on the current platform.
    #[error("Operation not supported on {platform}")]
    Unsupported { platform: String },

    /// A symlink operation failed.
    #[error("Symlink error: {0}")]
    Symlink(String),
}
