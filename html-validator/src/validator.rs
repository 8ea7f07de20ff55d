//! The validator stage: checks each record and attaches a [`ValidationResult`].
//!
//! Records are validated strictly one at a time. The output stream is lazy:
//! the next record is only pulled from the input, and the next checker call
//! only issued, once the consumer asks for the next item. Dropping the stream
//! drops any in-flight call along with its result.

use std::pin::Pin;

use futures::stream::{self, Stream, StreamExt};

use crate::checker::Checker;
use crate::config::ValidatorConfig;
use crate::endpoint::EndpointSource;
use crate::error::PipelineError;
use crate::message::normalize_response;
use crate::record::{AnnotatedRecord, FileRecord};
use crate::result::ValidationResult;

/// Checks file records against a [`Checker`].
#[derive(Debug, Clone)]
pub struct Validator<C> {
    config: ValidatorConfig,
    checker: C,
    endpoint: EndpointSource,
}

impl<C: Checker> Validator<C> {
    /// A validator reading the process-wide endpoint at every call.
    #[must_use]
    pub fn new(config: ValidatorConfig, checker: C) -> Self {
        Self {
            config,
            checker,
            endpoint: EndpointSource::ProcessWide,
        }
    }

    /// Override where the checker endpoint comes from.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<EndpointSource>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate a single record.
    ///
    /// Inert records (no contents, or empty contents) come back without a result.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Checker`] if the checker call fails.
    pub async fn validate_record(&self, record: FileRecord) -> Result<AnnotatedRecord, PipelineError> {
        let Some(content) = record.checkable_bytes() else {
            tracing::debug!(file = %record.path().display(), "Skipping file without contents");
            return Ok(AnnotatedRecord::unvalidated(record));
        };

        let endpoint = self.endpoint.resolve();
        let raw = self
            .checker
            .check(content, &endpoint, &self.config.checker)
            .await?;

        let result = ValidationResult::from_messages(normalize_response(&raw), &self.config);
        tracing::debug!(
            file = %record.relative().display(),
            success = result.success,
            messages = result.messages.len(),
            "Validated file"
        );
        Ok(AnnotatedRecord::validated(record, result))
    }

    /// Turn a stream of records into a stream of validated records.
    ///
    /// Order is preserved. The stream ends after yielding the first error.
    pub fn validate<S>(self, input: S) -> impl Stream<Item = Result<AnnotatedRecord, PipelineError>>
    where
        S: Stream<Item = FileRecord>,
    {
        let state = StageState {
            validator: self,
            input: Box::pin(input),
            finished: false,
        };

        stream::unfold(state, |mut state| async move {
            if state.finished {
                return None;
            }
            let record = state.input.next().await?;
            let outcome = state.validator.validate_record(record).await;
            if let Err(e) = &outcome {
                tracing::debug!(error = %e, "Validator stage terminated");
                state.finished = true;
            }
            Some((outcome, state))
        })
    }
}

struct StageState<C, S> {
    validator: Validator<C>,
    input: Pin<Box<S>>,
    finished: bool,
}
