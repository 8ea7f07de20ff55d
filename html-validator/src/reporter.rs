//! The reporter stage: turns attached results into pass/fail for the whole run.
//!
//! The stage only relies on [`AnnotatedRecord`], never on the validator itself,
//! so any producer of annotated records can feed it.

use std::fmt;
use std::sync::Arc;

use futures::stream::{self, Stream, StreamExt};

use crate::error::{PipelineError, ReporterError};
use crate::message::MessageType;
use crate::record::AnnotatedRecord;

/// User-supplied reporter callback, invoked once per record in order.
pub type CustomReporter = dyn Fn(&AnnotatedRecord) -> Result<(), ReporterError> + Send + Sync;

/// How the reporter stage judges each record.
#[derive(Clone, Default)]
pub enum Reporter {
    /// Fail on the first record whose attached result is unsuccessful.
    #[default]
    FailOnError,
    /// Hand every record to a callback, which owns all pass/fail decisions.
    Custom(Arc<CustomReporter>),
}

impl Reporter {
    /// A reporter that delegates to `callback`.
    #[must_use]
    pub fn custom<F>(callback: F) -> Self
    where
        F: Fn(&AnnotatedRecord) -> Result<(), ReporterError> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(callback))
    }

    /// Judge a single record.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ValidationFailed`] from the default reporter
    /// when the record's result is unsuccessful, or
    /// [`PipelineError::Reporter`] when a custom callback fails.
    pub fn report_record(&self, annotated: &AnnotatedRecord) -> Result<(), PipelineError> {
        match self {
            Self::FailOnError => fail_on_error(annotated),
            Self::Custom(callback) => callback(annotated).map_err(PipelineError::Reporter),
        }
    }

    /// Re-emit records that pass, ending the stream at the first failure.
    ///
    /// Upstream errors are forwarded and also end the stream.
    pub fn report<S>(self, input: S) -> impl Stream<Item = Result<AnnotatedRecord, PipelineError>>
    where
        S: Stream<Item = Result<AnnotatedRecord, PipelineError>>,
    {
        let state = (self, Box::pin(input), false);

        stream::unfold(state, |(reporter, mut input, finished)| async move {
            if finished {
                return None;
            }
            let outcome = match input.next().await? {
                Ok(annotated) => reporter.report_record(&annotated).map(|()| annotated),
                Err(e) => Err(e),
            };
            let finished = outcome.is_err();
            Some((outcome, (reporter, input, finished)))
        })
    }

    /// Like [`Reporter::report`], for producers that cannot fail.
    pub fn report_records<S>(
        self,
        input: S,
    ) -> impl Stream<Item = Result<AnnotatedRecord, PipelineError>>
    where
        S: Stream<Item = AnnotatedRecord>,
    {
        self.report(input.map(Ok))
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FailOnError => f.write_str("FailOnError"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

fn fail_on_error(annotated: &AnnotatedRecord) -> Result<(), PipelineError> {
    let Some(result) = annotated.result() else {
        return Ok(());
    };
    let file = annotated.record().relative();
    if result.success {
        tracing::debug!(file = %file.display(), "HTML validation passed");
        return Ok(());
    }

    for message in &result.messages {
        let line = message.format_human_readable(file);
        match message.kind {
            MessageType::Info => tracing::info!("{line}"),
            MessageType::Error => tracing::error!("{line}"),
            MessageType::NonDocumentError | MessageType::Other(_) => tracing::warn!("{line}"),
        }
    }
    Err(PipelineError::ValidationFailed {
        path: annotated.record().path().to_path_buf(),
    })
}
