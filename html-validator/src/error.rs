//! Error types for the validation pipeline.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Fixed message carried by the default reporter when a file fails validation.
pub const VALIDATION_FAILED_MESSAGE: &str = "HTML validation error(s) found";

/// Error returned by a user-supplied reporter callback.
pub type ReporterError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A transport-level failure while talking to the checker service.
///
/// These are never retried: the stage that hit one terminates its stream.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CheckerError {
    /// The configured endpoint is not a usable URL.
    #[error("Invalid checker endpoint '{endpoint}': {cause}")]
    InvalidEndpoint {
        /// The endpoint as configured.
        endpoint: String,
        /// Human-readable description of the problem.
        cause: String,
    },

    /// The HTTP client could not be built (bad proxy, TLS backend failure).
    #[error("Failed to build checker client: {source}")]
    Client {
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The request could not be sent or the response could not be read.
    #[error("Checker request to {endpoint} failed: {source}")]
    Http {
        /// The endpoint the request was sent to.
        endpoint: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The checker answered with a non-success HTTP status.
    #[error("Checker at {endpoint} responded with HTTP {status}")]
    Status {
        /// The endpoint the request was sent to.
        endpoint: String,
        /// HTTP status code.
        status: u16,
    },

    /// The checker answered, but the body was not a JSON message report.
    #[error("Checker at {endpoint} returned an unreadable response: {cause}")]
    Decode {
        /// The endpoint the request was sent to.
        endpoint: String,
        /// Human-readable description of the problem.
        cause: String,
    },
}

/// A stream-terminating failure in either pipeline stage.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// The checker could not be reached or gave an unusable answer.
    #[error(transparent)]
    Checker(#[from] CheckerError),

    /// The default reporter saw a record whose attached result failed.
    #[error("HTML validation error(s) found")]
    ValidationFailed {
        /// Path of the first failing file.
        path: PathBuf,
    },

    /// A custom reporter raised an error; surfaced unchanged.
    #[error(transparent)]
    Reporter(ReporterError),
}

impl PipelineError {
    /// Path of the failing file, when the error is a validation failure.
    #[must_use]
    pub fn failed_path(&self) -> Option<&std::path::Path> {
        match self {
            Self::ValidationFailed { path } => Some(path),
            Self::Checker(_) | Self::Reporter(_) => None,
        }
    }
}

/// The kind of scan-level failure that kept a file out of the pipeline.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScanErrorKind {
    /// An I/O error occurred while reading the file.
    IoError,
    /// The file exceeded the configured maximum size limit.
    FileTooLarge,
    /// The resolved path escapes the scan root (symlink escape).
    OutsideRoot,
    /// A directory traversal error (permission denied, loop detected, etc.).
    WalkError,
    /// An exclude glob pattern could not be parsed.
    InvalidExcludePattern,
}

/// A file that was discovered but could not be turned into a record.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct ScanError {
    /// The file path that could not be loaded.
    pub file: PathBuf,
    /// The kind of failure.
    pub kind: ScanErrorKind,
    /// Human-readable description of the failure.
    pub message: String,
}

impl ScanError {
    /// Format the error for human-readable output.
    #[must_use]
    pub fn format_human_readable(&self) -> String {
        format!("{}: [scan error] {}", self.file.display(), self.message)
    }
}
