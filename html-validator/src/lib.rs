//! # html-validator
//!
//! Stream stages that submit HTML files to a Nu HTML checker and turn the
//! answers into a pass/fail outcome.
//!
//! - The **validator** stage ([`validate`], [`Validator`]) attaches a
//!   [`ValidationResult`] to every record it checks.
//! - The **reporter** stage ([`report`], [`Reporter`]) ends the stream at the
//!   first failing record, or hands each record to a custom callback.
//!
//! The two stages only share [`AnnotatedRecord`], so either can be fed by
//! another producer.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::{TryStreamExt, stream};
//! use html_validator::{FileRecord, ValidatorConfig, report, set_checker_endpoint, validate};
//!
//! # async fn run() -> anyhow::Result<()> {
//! set_checker_endpoint("http://localhost:8888/");
//!
//! let records = vec![FileRecord::new(
//!     "site/index.html",
//!     "site",
//!     b"<!doctype html><title>Home</title>".to_vec(),
//! )];
//!
//! let config = ValidatorConfig::default()
//!     .with_verify_message(|_, message| !message.starts_with("Consider adding"));
//! let validated = validate(config)?.validate(stream::iter(records));
//! let passed: Vec<_> = report(None).report(validated).try_collect().await?;
//! println!("{} file(s) passed", passed.len());
//! # Ok(())
//! # }
//! ```

pub mod checker;
mod config;
mod endpoint;
mod error;
mod message;
pub mod output;
mod record;
mod report;
mod reporter;
mod result;
pub mod strategy;
mod validator;

use std::sync::Arc;

pub use checker::{Checker, HttpChecker};
pub use config::{CheckerOptions, FsSourceConfig, ValidatorConfig, VerifyMessage};
pub use endpoint::{
    DEFAULT_CHECKER_ENDPOINT, EndpointSource, checker_endpoint, set_checker_endpoint,
};
pub use error::{
    CheckerError, PipelineError, ReporterError, ScanError, ScanErrorKind,
    VALIDATION_FAILED_MESSAGE,
};
pub use message::{MessageType, ValidationMessage, normalize_response};
pub use record::{AnnotatedRecord, Contents, FileRecord, RecordSummary};
pub use report::ValidationReport;
pub use reporter::{CustomReporter, Reporter};
pub use result::ValidationResult;
pub use strategy::fs::load_records;
pub use validator::Validator;

/// Build a validator stage over the HTTP checker and the process-wide endpoint.
///
/// # Errors
///
/// Returns [`CheckerError::Client`] if the HTTP client cannot be built from
/// `config.checker` (e.g. an invalid proxy URL).
pub fn validate(config: ValidatorConfig) -> Result<Validator<HttpChecker>, CheckerError> {
    let checker = HttpChecker::new(&config.checker)?;
    Ok(Validator::new(config, checker))
}

/// Build a reporter stage: the default fail-on-error policy, or `custom`.
#[must_use]
pub fn report(custom: Option<Arc<CustomReporter>>) -> Reporter {
    custom.map_or(Reporter::FailOnError, Reporter::Custom)
}
