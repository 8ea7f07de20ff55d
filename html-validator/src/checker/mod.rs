//! The seam between the pipeline and the remote checker service.
//!
//! The pipeline only needs "content in, raw JSON report out". [`HttpChecker`]
//! talks to a Nu checker over HTTP; tests and embedders can plug in anything
//! else that implements [`Checker`].

pub mod http;

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::config::CheckerOptions;
use crate::error::CheckerError;

pub use http::HttpChecker;

/// A client for an HTML conformance checker.
pub trait Checker: Send + Sync {
    /// Submit `content` to the checker at `endpoint`.
    ///
    /// Resolves to the checker's raw report, which the validator normalizes
    /// with [`crate::message::normalize_response`].
    ///
    /// # Errors
    ///
    /// Returns a [`CheckerError`] when the call cannot complete. The validator
    /// treats every such error as fatal.
    fn check(
        &self,
        content: &[u8],
        endpoint: &str,
        options: &CheckerOptions,
    ) -> impl Future<Output = Result<Value, CheckerError>> + Send;
}

impl<C: Checker> Checker for Arc<C> {
    fn check(
        &self,
        content: &[u8],
        endpoint: &str,
        options: &CheckerOptions,
    ) -> impl Future<Output = Result<Value, CheckerError>> + Send {
        (**self).check(content, endpoint, options)
    }
}
