//! Nu HTML checker client over HTTP.
//!
//! The document is POSTed as the request body to `{endpoint}?out=json` and the
//! checker answers with `{"messages": [...]}`.

use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Proxy, Url};
use serde_json::Value;

use crate::checker::Checker;
use crate::config::CheckerOptions;
use crate::error::CheckerError;
use crate::message::MessageType;

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
const DEFAULT_USER_AGENT: &str = concat!("html-validator-rs/", env!("CARGO_PKG_VERSION"));

/// HTTP client for a Nu checker instance.
#[derive(Debug, Clone)]
pub struct HttpChecker {
    client: Client,
}

impl HttpChecker {
    /// Build a client honouring the connection-level options (`proxy`).
    ///
    /// Request-level options (`timeout`, `user_agent`,
    /// `relaxed_non_document_errors`) are read on every call instead.
    ///
    /// # Errors
    ///
    /// Returns [`CheckerError::Client`] if the proxy URL is invalid or the
    /// HTTP client cannot be initialised.
    pub fn new(options: &CheckerOptions) -> Result<Self, CheckerError> {
        let mut builder = Client::builder();
        if let Some(proxy) = &options.proxy {
            let proxy = Proxy::all(proxy).map_err(|source| CheckerError::Client { source })?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|source| CheckerError::Client { source })?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn post(
        &self,
        content: &[u8],
        endpoint: &str,
        options: &CheckerOptions,
    ) -> Result<Value, CheckerError> {
        let url = request_url(endpoint)?;
        let user_agent = options.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);

        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, HTML_CONTENT_TYPE)
            .header(USER_AGENT, user_agent)
            .body(content.to_vec());
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }

        tracing::debug!(endpoint, bytes = content.len(), "Submitting document to checker");
        let response = request.send().await.map_err(|source| CheckerError::Http {
            endpoint: endpoint.to_owned(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CheckerError::Status {
                endpoint: endpoint.to_owned(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| CheckerError::Http {
            endpoint: endpoint.to_owned(),
            source,
        })?;
        let mut report: Value =
            serde_json::from_slice(&body).map_err(|e| CheckerError::Decode {
                endpoint: endpoint.to_owned(),
                cause: e.to_string(),
            })?;

        if options.relaxed_non_document_errors {
            relax_non_document_errors(&mut report);
        }
        Ok(report)
    }
}

impl Checker for HttpChecker {
    async fn check(
        &self,
        content: &[u8],
        endpoint: &str,
        options: &CheckerOptions,
    ) -> Result<Value, CheckerError> {
        self.post(content, endpoint, options).await
    }
}

/// `{endpoint}` with `out=json` appended to its query.
fn request_url(endpoint: &str) -> Result<Url, CheckerError> {
    let mut url = Url::parse(endpoint).map_err(|e| CheckerError::InvalidEndpoint {
        endpoint: endpoint.to_owned(),
        cause: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(CheckerError::InvalidEndpoint {
            endpoint: endpoint.to_owned(),
            cause: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    url.query_pairs_mut().append_pair("out", "json");
    Ok(url)
}

/// Rewrite `non-document-error` entries as `info` in place.
///
/// Covers the same response shapes as [`normalize_response`], with type
/// strings matched the same way.
///
/// [`normalize_response`]: crate::message::normalize_response
fn relax_non_document_errors(report: &mut Value) {
    let messages = match report {
        Value::Object(fields) => match fields.get_mut("messages") {
            Some(Value::Array(items)) => items,
            _ => return,
        },
        Value::Array(items) => items,
        _ => return,
    };
    for message in messages {
        if let Some(kind) = message.get_mut("type")
            && let Some(text) = kind.as_str()
            && MessageType::from(text) == MessageType::NonDocumentError
        {
            *kind = Value::String(MessageType::Info.as_str().to_owned());
        }
    }
}
