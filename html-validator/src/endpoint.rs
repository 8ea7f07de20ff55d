//! Checker endpoint configuration.
//!
//! A single process-wide endpoint exists for callers that want the
//! set-it-once behaviour. Validators never read it implicitly: they carry an
//! [`EndpointSource`] and resolve it once per checker call, so a call sees the
//! value current when it is issued and keeps it until it completes.

use std::sync::{LazyLock, PoisonError, RwLock};

/// Endpoint used until [`set_checker_endpoint`] is called.
pub const DEFAULT_CHECKER_ENDPOINT: &str = "https://validator.w3.org/nu/";

static CHECKER_ENDPOINT: LazyLock<RwLock<String>> =
    LazyLock::new(|| RwLock::new(DEFAULT_CHECKER_ENDPOINT.to_owned()));

/// Replace the process-wide checker endpoint. Last write wins.
///
/// Calls issued after this returns use the new value; calls already in
/// flight are unaffected.
pub fn set_checker_endpoint(url: impl Into<String>) {
    let url = url.into();
    tracing::debug!(endpoint = %url, "Checker endpoint updated");
    *CHECKER_ENDPOINT
        .write()
        .unwrap_or_else(PoisonError::into_inner) = url;
}

/// The current process-wide checker endpoint.
#[must_use]
pub fn checker_endpoint() -> String {
    CHECKER_ENDPOINT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Where a validator gets its endpoint from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EndpointSource {
    /// Read the process-wide value at each call.
    #[default]
    ProcessWide,
    /// Always use this endpoint.
    Fixed(String),
}

impl EndpointSource {
    /// Snapshot the endpoint for one checker call.
    #[must_use]
    pub fn resolve(&self) -> String {
        match self {
            Self::ProcessWide => checker_endpoint(),
            Self::Fixed(url) => url.clone(),
        }
    }
}

impl From<&str> for EndpointSource {
    fn from(url: &str) -> Self {
        Self::Fixed(url.to_owned())
    }
}

impl From<String> for EndpointSource {
    fn from(url: String) -> Self {
        Self::Fixed(url)
    }
}
