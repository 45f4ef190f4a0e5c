//! Registry of the documents taking part in a compilation
//!
//! Copyright (c) 2025 Posit, PBC

use crate::types::FileId;

/// Every file that contributed to a compilation, in registration order.
///
/// The main document is registered first, then each imported file the
/// first time it is loaded. `FileId(n)` is the n-th registered file.
#[derive(Debug, Clone, Default)]
pub struct SourceContext {
    files: Vec<SourceFile>,
}

/// A source file and its content
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path of the file, or a synthetic label such as `stdin`
    pub path: String,
    /// File content, when known
    pub content: Option<String>,
}

impl SourceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file and return its id.
    pub fn add_file(&mut self, path: String, content: Option<String>) -> FileId {
        let id = FileId(self.files.len());
        self.files.push(SourceFile { path, content });
        id
    }

    /// Id of an already registered file with the given path.
    pub fn find_file(&self, path: &str) -> Option<FileId> {
        self.files
            .iter()
            .position(|file| file.path == path)
            .map(FileId)
    }

    pub fn get_file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.0)
    }

    /// Path (or label) of a file; empty for unknown ids.
    pub fn path(&self, id: FileId) -> &str {
        self.get_file(id).map(|f| f.path.as_str()).unwrap_or("")
    }

    pub fn files(&self) -> impl Iterator<Item = (FileId, &SourceFile)> {
        self.files
            .iter()
            .enumerate()
            .map(|(idx, file)| (FileId(idx), file))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_follow_registration_order() {
        let mut ctx = SourceContext::new();
        let a = ctx.add_file("stdin".into(), Some("a".into()));
        let b = ctx.add_file("/tmp/_b.scss".into(), Some("b".into()));

        assert_eq!(a, FileId(0));
        assert_eq!(b, FileId(1));
        assert_eq!(ctx.path(b), "/tmp/_b.scss");
        assert_eq!(ctx.find_file("stdin"), Some(a));
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_file_without_content() {
        let mut ctx = SourceContext::new();
        let id = ctx.add_file("remote.scss".into(), None);
        assert!(ctx.get_file(id).unwrap().content.is_none());
        assert_eq!(ctx.path(FileId(9)), "");
    }
}
