//! Configuration types for the validator stage.
//!
//! Split into the stage's own policy (what to keep, what counts) and the
//! checker options that are handed to the checker client untouched.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::message::MessageType;

/// Per-message verification predicate.
///
/// Called once per checker message, in checker order, with the message type
/// and text. Returning `false` discards the message before success is computed.
pub type VerifyMessage = dyn Fn(&MessageType, &str) -> bool + Send + Sync;

/// Options forwarded to the checker client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct CheckerOptions {
    /// Downgrade `non-document-error` messages to `info` so they no longer fail a file.
    pub relaxed_non_document_errors: bool,
    /// HTTP(S) proxy to route checker requests through.
    pub proxy: Option<String>,
    /// Per-request timeout. `None` leaves the request unbounded.
    pub timeout: Option<Duration>,
    /// `User-Agent` header sent with each request.
    pub user_agent: Option<String>,
}

/// Validator stage configuration.
#[derive(Clone)]
#[non_exhaustive]
pub struct ValidatorConfig {
    /// Keep `info` messages in the attached list (default: off).
    /// Never affects success.
    pub show_info: bool,
    /// Verification predicate; the default keeps every message.
    pub verify_message: Arc<VerifyMessage>,
    /// Options for the checker client.
    pub checker: CheckerOptions,
}

impl ValidatorConfig {
    /// Keep or strip `info` messages in the attached list.
    #[must_use]
    pub fn with_show_info(mut self, show_info: bool) -> Self {
        self.show_info = show_info;
        self
    }

    /// Install a verification predicate.
    #[must_use]
    pub fn with_verify_message<F>(mut self, verify: F) -> Self
    where
        F: Fn(&MessageType, &str) -> bool + Send + Sync + 'static,
    {
        self.verify_message = Arc::new(verify);
        self
    }

    /// Replace the checker options.
    #[must_use]
    pub fn with_checker_options(mut self, checker: CheckerOptions) -> Self {
        self.checker = checker;
        self
    }

    /// Apply the verification predicate to one message.
    #[must_use]
    pub fn accepts(&self, kind: &MessageType, message: &str) -> bool {
        (self.verify_message)(kind, message)
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            show_info: false,
            verify_message: Arc::new(|_: &MessageType, _: &str| true),
            checker: CheckerOptions::default(),
        }
    }
}

impl fmt::Debug for ValidatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorConfig")
            .field("show_info", &self.show_info)
            .field("checker", &self.checker)
            .finish_non_exhaustive()
    }
}

/// Filesystem source options for loading records from disk.
///
/// `paths` is required and must be non-empty.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct FsSourceConfig {
    /// Files or directories to load.
    pub paths: Vec<PathBuf>,
    /// Base for relative paths. Defaults to each directory root, or a file
    /// root's parent directory.
    pub base: Option<PathBuf>,
    /// Exclude patterns (glob format).
    pub exclude: Vec<String>,
    /// Whether to follow symbolic links (default: `false`).
    pub follow_links: bool,
    /// Maximum directory traversal depth (default: 64).
    pub max_depth: usize,
    /// Maximum file size in bytes (default: 10 MB).
    pub max_file_size: u64,
}

impl Default for FsSourceConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            base: None,
            exclude: Vec::new(),
            follow_links: false,
            max_depth: 64,
            max_file_size: 10_485_760,
        }
    }
}
