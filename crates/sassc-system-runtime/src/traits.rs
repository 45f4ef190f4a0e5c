/*
 * traits.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Defines the SystemRuntime trait and its error type.
 */

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// File content is not valid text
    #[error("Invalid UTF-8 in {path}: {message}")]
    InvalidUtf8 { path: PathBuf, message: String },
}

/// Type of filesystem path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Regular file
    File,
    /// Directory
    Directory,
}

/// Read-only file access used while compiling.
///
/// Implementations must be safe to share across threads: independent
/// engines may compile concurrently against one runtime, and none of the
/// operations here write.
pub trait SystemRuntime: Send + Sync {
    /// Read entire file contents as bytes.
    fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// Read file as a UTF-8 string.
    fn file_read_string(&self, path: &Path) -> RuntimeResult<String> {
        let bytes = self.file_read(path)?;
        String::from_utf8(bytes).map_err(|e| RuntimeError::InvalidUtf8 {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Check if path exists, optionally filtering by type.
    fn path_exists(&self, path: &Path, kind: Option<PathKind>) -> RuntimeResult<bool>;

    /// Check if path exists and is a file.
    fn is_file(&self, path: &Path) -> RuntimeResult<bool> {
        self.path_exists(path, Some(PathKind::File))
    }

    /// Check if path exists and is a directory.
    fn is_dir(&self, path: &Path) -> RuntimeResult<bool> {
        self.path_exists(path, Some(PathKind::Directory))
    }

    /// Make a path absolute and normalized.
    ///
    /// Two different spellings of the same file must canonicalize to the
    /// same path; the import resolver de-duplicates dependencies on it.
    fn canonicalize(&self, path: &Path) -> RuntimeResult<PathBuf>;

    /// Current working directory, used to resolve relative load paths and
    /// imports from documents that have no file of their own.
    fn cwd(&self) -> RuntimeResult<PathBuf>;
}
