//! Run-level summary over many annotated records.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::ScanError;
use crate::record::{AnnotatedRecord, RecordSummary};

/// Result of a validation run.
///
/// A non-empty `scan_errors` means some files never reached the checker;
/// treat that as a failure regardless of the per-file results.
#[derive(Debug, Clone, Serialize)]
#[non_exhaustive]
pub struct ValidationReport {
    /// Number of files checked (records that carry a result).
    pub scanned_files: usize,
    /// Number of checked files whose result is unsuccessful.
    pub failed_files: usize,
    /// Number of inert records that passed through without a result.
    pub skipped_files: usize,
    /// Whether every checked file passed AND no scan errors occurred.
    pub ok: bool,
    /// Per-file path metadata and attached results, in pipeline order.
    pub files: Vec<RecordSummary>,
    /// Files that could not be loaded.
    pub scan_errors: Vec<ScanError>,
    /// The failing file a fail-fast run stopped at. Files after it were not checked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<PathBuf>,
}

impl ValidationReport {
    /// Summarize a finished run.
    #[must_use]
    pub fn collect(records: &[AnnotatedRecord], scan_errors: Vec<ScanError>) -> Self {
        let files: Vec<RecordSummary> = records.iter().map(AnnotatedRecord::summary).collect();
        let scanned_files = records.iter().filter(|r| r.has_result()).count();
        let failed_files = records
            .iter()
            .filter_map(AnnotatedRecord::result)
            .filter(|result| !result.success)
            .count();

        Self {
            scanned_files,
            failed_files,
            skipped_files: records.len() - scanned_files,
            ok: failed_files == 0 && scan_errors.is_empty(),
            files,
            scan_errors,
            stopped_at: None,
        }
    }

    /// Mark the run as stopped at `path`, a checked file that failed.
    ///
    /// The failing file is counted as checked and failed even though its
    /// record is not part of `files`.
    #[must_use]
    pub fn with_stop(mut self, path: PathBuf) -> Self {
        self.scanned_files += 1;
        self.failed_files += 1;
        self.ok = false;
        self.stopped_at = Some(path);
        self
    }

    /// Files whose attached result is unsuccessful.
    pub fn failures(&self) -> impl Iterator<Item = &RecordSummary> {
        self.files
            .iter()
            .filter(|f| f.validation.as_ref().is_some_and(|v| !v.success))
    }

    /// Number of non-`info` messages across all files.
    #[must_use]
    pub fn errors_count(&self) -> usize {
        self.files
            .iter()
            .filter_map(|f| f.validation.as_ref())
            .map(crate::result::ValidationResult::errors_count)
            .sum()
    }
}
