/*
 * memory.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * In-memory SystemRuntime.
 *
 * Lets the compiler resolve imports without touching the disk: tests and
 * embedders pre-populate a VirtualFileSystem and compile against it.
 */

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::{PathKind, RuntimeError, RuntimeResult, SystemRuntime};

fn not_found_error(path: &Path) -> RuntimeError {
    RuntimeError::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!("Path not found: {}", path.display()),
    ))
}

/// Virtual filesystem holding files as byte buffers.
///
/// Directories are implied by the files added to it. Relative paths are
/// taken relative to the root directory, which doubles as the working
/// directory of the runtime.
#[derive(Debug)]
pub struct VirtualFileSystem {
    /// File contents, keyed by normalized absolute path
    files: HashMap<PathBuf, Vec<u8>>,
    /// Directory entries (includes parents of all files)
    directories: HashSet<PathBuf>,
    root: PathBuf,
}

impl Default for VirtualFileSystem {
    fn default() -> Self {
        Self::with_root(PathBuf::from("/project"))
    }
}

impl VirtualFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filesystem whose working directory is `root`.
    pub fn with_root(root: PathBuf) -> Self {
        let mut vfs = Self {
            files: HashMap::new(),
            directories: HashSet::new(),
            root: PathBuf::from("/"),
        };
        let root = vfs.normalize_path(&root);
        vfs.add_directory_and_parents(&root);
        vfs.root = root;
        vfs
    }

    /// Add a file, creating its parent directories.
    pub fn add_file(&mut self, path: &Path, contents: Vec<u8>) {
        let normalized = self.normalize_path(path);
        if let Some(parent) = normalized.parent() {
            self.add_directory_and_parents(parent);
        }
        self.files.insert(normalized, contents);
    }

    /// Remove a file. Returns true if it existed.
    pub fn remove_file(&mut self, path: &Path) -> bool {
        let normalized = self.normalize_path(path);
        self.files.remove(&normalized).is_some()
    }

    pub fn add_directory(&mut self, path: &Path) {
        let normalized = self.normalize_path(path);
        self.add_directory_and_parents(&normalized);
    }

    pub fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(&self.normalize_path(path))
    }

    pub fn is_directory(&self, path: &Path) -> bool {
        self.directories.contains(&self.normalize_path(path))
    }

    pub fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        let normalized = self.normalize_path(path);
        self.files
            .get(&normalized)
            .cloned()
            .ok_or_else(|| not_found_error(&normalized))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Make a path absolute (relative to the root) and drop `.`/`..`.
    pub fn normalize_path(&self, path: &Path) -> PathBuf {
        let absolute = if path.has_root() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let mut normalized = PathBuf::new();
        for component in absolute.components() {
            match component {
                Component::ParentDir => {
                    // Can't go above root
                    if normalized.parent().is_some() {
                        normalized.pop();
                    }
                }
                Component::CurDir => {}
                other => normalized.push(other),
            }
        }
        if normalized.as_os_str().is_empty() {
            normalized.push("/");
        }
        normalized
    }

    fn add_directory_and_parents(&mut self, path: &Path) {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            self.directories.insert(current.clone());
        }
    }
}

/// Runtime over a [`VirtualFileSystem`].
///
/// The filesystem sits behind a `RwLock` so files can be added through a
/// shared reference while engines hold the runtime.
#[derive(Debug, Default)]
pub struct MemoryRuntime {
    vfs: RwLock<VirtualFileSystem>,
}

impl MemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vfs(vfs: VirtualFileSystem) -> Self {
        Self {
            vfs: RwLock::new(vfs),
        }
    }

    /// Runtime whose working directory is `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self::with_vfs(VirtualFileSystem::with_root(root.into()))
    }

    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        self.write().add_file(path.as_ref(), contents.into());
    }

    pub fn add_directory(&self, path: impl AsRef<Path>) {
        self.write().add_directory(path.as_ref());
    }

    pub fn remove_file(&self, path: impl AsRef<Path>) -> bool {
        self.write().remove_file(path.as_ref())
    }

    fn read(&self) -> RwLockReadGuard<'_, VirtualFileSystem> {
        // Nothing panics while holding the lock, so a poisoned guard still
        // holds consistent data.
        self.vfs.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, VirtualFileSystem> {
        self.vfs.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl SystemRuntime for MemoryRuntime {
    fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        self.read().read_file(path)
    }

    fn path_exists(&self, path: &Path, kind: Option<PathKind>) -> RuntimeResult<bool> {
        let vfs = self.read();
        Ok(match kind {
            None => vfs.is_file(path) || vfs.is_directory(path),
            Some(PathKind::File) => vfs.is_file(path),
            Some(PathKind::Directory) => vfs.is_directory(path),
        })
    }

    fn canonicalize(&self, path: &Path) -> RuntimeResult<PathBuf> {
        let vfs = self.read();
        let normalized = vfs.normalize_path(path);
        if vfs.is_file(&normalized) || vfs.is_directory(&normalized) {
            Ok(normalized)
        } else {
            Err(not_found_error(&normalized))
        }
    }

    fn cwd(&self) -> RuntimeResult<PathBuf> {
        Ok(self.read().root().to_path_buf())
    }
}
