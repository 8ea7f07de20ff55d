//! File records flowing through the pipeline.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::result::ValidationResult;

/// Contents of a file record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contents {
    /// The file's bytes.
    Buffer(Vec<u8>),
    /// A directory or placeholder with no readable contents.
    Null,
}

/// One file travelling through the pipeline.
///
/// The stages never alter `path`, `base` or `contents`; they only attach a
/// result by wrapping the record in an [`AnnotatedRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    path: PathBuf,
    base: PathBuf,
    contents: Contents,
}

impl FileRecord {
    /// Create a record for a file with contents.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, base: impl Into<PathBuf>, contents: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            base: base.into(),
            contents: Contents::Buffer(contents),
        }
    }

    /// Create a record with no contents (a directory or placeholder).
    #[must_use]
    pub fn null(path: impl Into<PathBuf>, base: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            base: base.into(),
            contents: Contents::Null,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    #[must_use]
    pub fn contents(&self) -> &Contents {
        &self.contents
    }

    /// The path relative to `base`, or the full path if it lies outside `base`.
    #[must_use]
    pub fn relative(&self) -> &Path {
        self.path.strip_prefix(&self.base).unwrap_or(&self.path)
    }

    /// Bytes to submit to the checker, or `None` for inert records.
    #[must_use]
    pub fn checkable_bytes(&self) -> Option<&[u8]> {
        match &self.contents {
            Contents::Buffer(bytes) if !bytes.is_empty() => Some(bytes.as_slice()),
            Contents::Buffer(_) | Contents::Null => None,
        }
    }

    /// Inert records pass through the validator without a result.
    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.checkable_bytes().is_none()
    }
}

/// A record plus the result the validator attached to it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedRecord {
    record: FileRecord,
    result: Option<ValidationResult>,
}

impl AnnotatedRecord {
    /// Attach a result to a record.
    #[must_use]
    pub fn validated(record: FileRecord, result: ValidationResult) -> Self {
        Self {
            record,
            result: Some(result),
        }
    }

    /// Wrap a record that carries no result.
    #[must_use]
    pub fn unvalidated(record: FileRecord) -> Self {
        Self {
            record,
            result: None,
        }
    }

    #[must_use]
    pub fn has_result(&self) -> bool {
        self.result.is_some()
    }

    #[must_use]
    pub fn result(&self) -> Option<&ValidationResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn record(&self) -> &FileRecord {
        &self.record
    }

    #[must_use]
    pub fn into_record(self) -> FileRecord {
        self.record
    }

    /// Serializable view used by JSON output.
    #[must_use]
    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            path: self.record.path.clone(),
            relative: self.record.relative().to_path_buf(),
            validation: self.result.clone(),
        }
    }
}

impl From<FileRecord> for AnnotatedRecord {
    fn from(record: FileRecord) -> Self {
        Self::unvalidated(record)
    }
}

/// Path metadata and attached result of one record.
#[derive(Debug, Clone, Serialize)]
#[non_exhaustive]
pub struct RecordSummary {
    /// Full path of the file.
    pub path: PathBuf,
    /// Path relative to the record's base.
    pub relative: PathBuf,
    /// The attached result; absent for inert records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
}
