//! Filesystem record source.
//!
//! Discovers HTML files on disk and loads them as [`FileRecord`]s.
//! - Symlinks are not followed by default (`follow_links: false`)
//! - Resolved paths must stay within the scan root
//! - Device files, pipes, and sockets are skipped
//! - Reads are bounded by `max_file_size`

use std::io::Read;
use std::path::{Path, PathBuf};

use glob::Pattern;
use walkdir::WalkDir;

use crate::config::FsSourceConfig;
use crate::error::{ScanError, ScanErrorKind};
use crate::record::FileRecord;

/// Directories to skip
pub const SKIP_DIRS: &[&str] = &["target", "node_modules", ".git"];

/// A discovered file and the base its relative path is computed from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FoundFile {
    /// Path of the HTML file as discovered under its scan root.
    pub path: PathBuf,
    /// Directory the record's relative path is computed from.
    pub base: PathBuf,
}

fn matches_exclude(path: &Path, exclude_patterns: &[Pattern]) -> bool {
    let path_str = path.to_string_lossy();
    exclude_patterns.iter().any(|pattern| {
        pattern.matches(&path_str)
            || path
                .file_name()
                .is_some_and(|name| pattern.matches(&name.to_string_lossy()))
    })
}

/// Returns `true` if the entry should be **included** (i.e., is NOT a skip dir).
fn is_not_skip_dir(entry: &walkdir::DirEntry) -> bool {
    if entry.depth() > 0
        && entry.file_type().is_dir()
        && let Some(name) = entry.file_name().to_str()
    {
        return !SKIP_DIRS.contains(&name);
    }
    true
}

/// Check if file has an HTML extension.
fn is_html_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
}

fn base_for(root: &Path, config: &FsSourceConfig) -> PathBuf {
    if let Some(base) = &config.base {
        return base.clone();
    }
    if root.is_dir() {
        root.to_path_buf()
    } else {
        root.parent().map(Path::to_path_buf).unwrap_or_default()
    }
}

#[cfg(unix)]
fn is_special_file(entry: &walkdir::DirEntry) -> bool {
    use std::os::unix::fs::FileTypeExt;
    entry.metadata().map(|m| m.file_type()).is_ok_and(|ft| {
        ft.is_block_device() || ft.is_char_device() || ft.is_fifo() || ft.is_socket()
    })
}

#[cfg(not(unix))]
fn is_special_file(_entry: &walkdir::DirEntry) -> bool {
    false
}

/// Find all HTML files under the configured paths.
///
/// Returns `(files, scan_errors)`; walk errors, bad exclude patterns and
/// root escapes are reported, never silently discarded. Files are sorted so
/// the pipeline sees a deterministic order.
#[must_use]
pub fn find_files(config: &FsSourceConfig) -> (Vec<FoundFile>, Vec<ScanError>) {
    let mut files = Vec::new();
    let mut scan_errors = Vec::new();

    let mut exclude_patterns = Vec::with_capacity(config.exclude.len());
    for pat_str in &config.exclude {
        match Pattern::new(pat_str) {
            Ok(pat) => exclude_patterns.push(pat),
            Err(e) => scan_errors.push(ScanError {
                file: PathBuf::from(pat_str),
                kind: ScanErrorKind::InvalidExcludePattern,
                message: format!("Invalid exclude glob pattern '{pat_str}': {e}"),
            }),
        }
    }

    for root in &config.paths {
        let base = base_for(root, config);

        if root.is_file() {
            if !matches_exclude(root, &exclude_patterns) {
                files.push(FoundFile {
                    path: root.clone(),
                    base,
                });
            }
            continue;
        }

        let canonical_root = match root.canonicalize() {
            Ok(r) => r,
            Err(e) => {
                scan_errors.push(ScanError {
                    file: root.clone(),
                    kind: ScanErrorKind::IoError,
                    message: format!("Failed to canonicalize root path: {e}"),
                });
                continue;
            }
        };

        for entry_result in WalkDir::new(root)
            .follow_links(config.follow_links)
            .max_depth(config.max_depth)
            .into_iter()
            .filter_entry(is_not_skip_dir)
        {
            let entry = match entry_result {
                Ok(e) => e,
                Err(walk_err) => {
                    let path = walk_err
                        .path()
                        .map_or_else(|| root.clone(), Path::to_path_buf);
                    scan_errors.push(ScanError {
                        file: path,
                        kind: ScanErrorKind::WalkError,
                        message: format!("Directory traversal error: {walk_err}"),
                    });
                    continue;
                }
            };

            let file_path = entry.path();
            if !file_path.is_file() || is_special_file(&entry) || !is_html_file(file_path) {
                continue;
            }

            match file_path.canonicalize() {
                Ok(canonical) if canonical.starts_with(&canonical_root) => {}
                Ok(canonical) => {
                    scan_errors.push(ScanError {
                        file: file_path.to_path_buf(),
                        kind: ScanErrorKind::OutsideRoot,
                        message: format!(
                            "Path resolves outside scan root: {} -> {}",
                            file_path.display(),
                            canonical.display()
                        ),
                    });
                    continue;
                }
                Err(e) => {
                    scan_errors.push(ScanError {
                        file: file_path.to_path_buf(),
                        kind: ScanErrorKind::IoError,
                        message: format!("Failed to canonicalize path: {e}"),
                    });
                    continue;
                }
            }

            if matches_exclude(file_path, &exclude_patterns) {
                continue;
            }

            files.push(FoundFile {
                path: file_path.to_path_buf(),
                base: base.clone(),
            });
        }
    }

    files.sort();
    files.dedup();
    (files, scan_errors)
}

/// Read a file with a bounded read, enforcing `max_file_size`.
///
/// # Errors
///
/// Returns a [`ScanError`] if the file cannot be read or is too large.
pub fn read_file_bounded(path: &Path, max_file_size: u64) -> Result<Vec<u8>, ScanError> {
    let file = std::fs::File::open(path).map_err(|e| ScanError {
        file: path.to_owned(),
        kind: ScanErrorKind::IoError,
        message: format!("Failed to open file: {e}"),
    })?;

    // One byte over the limit is enough to detect an oversized file.
    let mut buffer = Vec::new();
    file.take(max_file_size.saturating_add(1))
        .read_to_end(&mut buffer)
        .map_err(|e| ScanError {
            file: path.to_owned(),
            kind: ScanErrorKind::IoError,
            message: format!("Failed to read file: {e}"),
        })?;

    if buffer.len() as u64 > max_file_size {
        return Err(ScanError {
            file: path.to_owned(),
            kind: ScanErrorKind::FileTooLarge,
            message: format!("File exceeds maximum size of {max_file_size} bytes"),
        });
    }
    Ok(buffer)
}

/// Discover and read every HTML file named by `config`.
///
/// # Errors
///
/// Returns an error if `config.paths` is empty or a path does not exist.
/// Per-file failures are returned alongside the records instead.
pub fn load_records(config: &FsSourceConfig) -> anyhow::Result<(Vec<FileRecord>, Vec<ScanError>)> {
    if config.paths.is_empty() {
        anyhow::bail!("No paths provided for validation");
    }
    for path in &config.paths {
        if !path.exists() {
            anyhow::bail!("Path does not exist: {}", path.display());
        }
    }

    let (files, mut scan_errors) = find_files(config);
    let mut records = Vec::with_capacity(files.len());
    for found in files {
        match read_file_bounded(&found.path, config.max_file_size) {
            Ok(contents) => records.push(FileRecord::new(found.path, found.base, contents)),
            Err(e) => scan_errors.push(e),
        }
    }

    tracing::debug!(
        records = records.len(),
        scan_errors = scan_errors.len(),
        "Loaded records from disk"
    );
    Ok((records, scan_errors))
}
