//! `@import` resolution against the search roots.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! An import name `X` is looked up in the importing file's directory and
//! then in each load path, in order. Within one directory the candidates
//! are tried as `_X.scss`, `X.scss`, `_X.sass`, `X.sass`; a name that
//! already ends in `.scss` or `.sass` is tried as `_X` and `X`. The first
//! existing file wins.
//!
//! Every file loaded is recorded once as a [`Dependency`], keyed by its
//! canonical path, in the order it was first imported.

use std::path::{Path, PathBuf};

use sassc_system_runtime::SystemRuntime;
use serde::Serialize;

use crate::options::Syntax;

/// A file that took part in a compilation through `@import`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    /// Canonical path of the imported file
    pub filename: PathBuf,
    pub options: DependencyOptions,
}

/// How a dependency was found and read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyOptions {
    /// Path the file was loaded from
    pub filename: PathBuf,
    /// Search root the import name was resolved against
    pub load_path: PathBuf,
    /// Syntax the file was parsed with, from its extension
    pub syntax: Syntax,
}

/// A resolved and loaded import target.
#[derive(Debug, Clone)]
pub(crate) struct LoadedFile {
    pub path: PathBuf,
    pub text: String,
    pub syntax: Syntax,
}

pub(crate) struct ImportResolver<'a> {
    runtime: &'a dyn SystemRuntime,
    load_paths: Vec<PathBuf>,
    dependencies: Vec<Dependency>,
    /// Files currently being evaluated, outermost first
    active: Vec<PathBuf>,
}

impl<'a> ImportResolver<'a> {
    /// Relative load paths are taken relative to the runtime's working
    /// directory.
    pub fn new(runtime: &'a dyn SystemRuntime, load_paths: &[PathBuf]) -> Self {
        let cwd = runtime.cwd().ok();
        let load_paths = load_paths
            .iter()
            .map(|p| match &cwd {
                Some(cwd) if p.is_relative() => cwd.join(p),
                _ => p.clone(),
            })
            .collect();
        Self {
            runtime,
            load_paths,
            dependencies: Vec::new(),
            active: Vec::new(),
        }
    }

    /// Mark the main document as being evaluated, so that importing it again
    /// is reported as a loop.
    pub fn enter_root(&mut self, path: &Path) {
        let canonical = self.canonical(path);
        self.active.push(canonical);
    }

    /// Find the file an import name refers to.
    ///
    /// Returns the path found and the search root it was found under.
    pub fn resolve(&self, url: &str, base_dir: &Path) -> Option<(PathBuf, PathBuf)> {
        let candidates = candidates(url);
        let roots = std::iter::once(base_dir).chain(self.load_paths.iter().map(PathBuf::as_path));
        for root in roots {
            for candidate in &candidates {
                let path = root.join(candidate);
                tracing::trace!(candidate = %path.display(), "probing import candidate");
                if self.runtime.is_file(&path).unwrap_or(false) {
                    return Some((path, root.to_path_buf()));
                }
            }
        }
        None
    }

    /// Resolve, read, and start evaluating an import. Every successful call
    /// must be paired with [`ImportResolver::leave`].
    pub fn load(&mut self, url: &str, base_dir: &Path) -> Result<LoadedFile, String> {
        let not_found = || format!("File to import not found or unreadable: {url}.");
        let (path, load_path) = self.resolve(url, base_dir).ok_or_else(not_found)?;
        let canonical = self.canonical(&path);

        if let Some(start) = self.active.iter().position(|p| *p == canonical) {
            let chain = self.active[start..]
                .iter()
                .chain(std::iter::once(&canonical))
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(" imports ");
            return Err(format!("An @import loop has been found: {chain}"));
        }

        let text = self.runtime.file_read_string(&path).map_err(|e| {
            tracing::debug!(path = %path.display(), error = %e, "import could not be read");
            not_found()
        })?;
        let syntax = Syntax::from_path(&path).unwrap_or_default();

        tracing::debug!(import = url, path = %canonical.display(), "resolved import");

        if !self.dependencies.iter().any(|d| d.filename == canonical) {
            self.dependencies.push(Dependency {
                filename: canonical.clone(),
                options: DependencyOptions {
                    filename: path.clone(),
                    load_path,
                    syntax,
                },
            });
        }
        self.active.push(canonical);

        Ok(LoadedFile { path, text, syntax })
    }

    /// Finish evaluating the innermost import.
    pub fn leave(&mut self) {
        self.active.pop();
    }

    pub fn into_dependencies(self) -> Vec<Dependency> {
        self.dependencies
    }

    fn canonical(&self, path: &Path) -> PathBuf {
        self.runtime
            .canonicalize(path)
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// File names tried for one import name, relative to a search root.
fn candidates(url: &str) -> Vec<PathBuf> {
    let path = Path::new(url);
    let parent = path.parent().unwrap_or(Path::new(""));
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return Vec::new();
    };
    if Syntax::from_path(path).is_some() {
        return vec![parent.join(format!("_{name}")), parent.join(name)];
    }
    [Syntax::Scss, Syntax::Indented]
        .iter()
        .flat_map(|syntax| {
            let ext = syntax.extension();
            [
                parent.join(format!("_{name}.{ext}")),
                parent.join(format!("{name}.{ext}")),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sassc_system_runtime::MemoryRuntime;

    fn runtime() -> MemoryRuntime {
        let rt = MemoryRuntime::new();
        rt.add_file("/project/styles/_vars.scss", "$a: 1;");
        rt.add_file("/project/styles/plain.sass", "$b: 2");
        rt.add_file("/project/lib/shared.scss", "$c: 3;");
        rt.add_file("/project/lib/nested/_deep.scss", "$d: 4;");
        rt
    }

    #[test]
    fn test_candidate_order() {
        let names: Vec<_> = candidates("dir/x")
            .into_iter()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(
            names,
            vec!["dir/_x.scss", "dir/x.scss", "dir/_x.sass", "dir/x.sass"]
        );
        assert_eq!(candidates("x.sass").len(), 2);
    }

    #[test]
    fn test_partial_found_in_base_dir() {
        let rt = runtime();
        let resolver = ImportResolver::new(&rt, &[]);
        let (path, root) = resolver.resolve("vars", Path::new("/project/styles")).unwrap();
        assert_eq!(path, PathBuf::from("/project/styles/_vars.scss"));
        assert_eq!(root, PathBuf::from("/project/styles"));
    }

    #[test]
    fn test_load_path_searched_after_base_dir() {
        let rt = runtime();
        let resolver = ImportResolver::new(&rt, &[PathBuf::from("lib")]);
        let (path, root) = resolver.resolve("shared", Path::new("/project/styles")).unwrap();
        assert_eq!(path, PathBuf::from("/project/lib/shared.scss"));
        assert_eq!(root, PathBuf::from("/project/lib"));
        assert!(resolver.resolve("nested/deep", Path::new("/project/styles")).is_some());
    }

    #[test]
    fn test_missing_import() {
        let rt = runtime();
        let mut resolver = ImportResolver::new(&rt, &[]);
        let err = resolver.load("nope", Path::new("/project")).unwrap_err();
        assert_eq!(err, "File to import not found or unreadable: nope.");
    }

    #[test]
    fn test_syntax_from_extension() {
        let rt = runtime();
        let mut resolver = ImportResolver::new(&rt, &[]);
        let loaded = resolver.load("plain", Path::new("/project/styles")).unwrap();
        assert_eq!(loaded.syntax, Syntax::Indented);
        assert_eq!(loaded.text, "$b: 2");
    }

    #[test]
    fn test_dependencies_recorded_once() {
        let rt = runtime();
        let mut resolver = ImportResolver::new(&rt, &[]);
        for _ in 0..2 {
            resolver.load("vars", Path::new("/project/styles")).unwrap();
            resolver.leave();
        }
        resolver.load("plain", Path::new("/project/styles")).unwrap();
        resolver.leave();
        let deps = resolver.into_dependencies();
        let names: Vec<_> = deps.iter().map(|d| d.filename.clone()).collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("/project/styles/_vars.scss"),
                PathBuf::from("/project/styles/plain.sass"),
            ]
        );
        assert_eq!(deps[1].options.syntax, Syntax::Indented);
    }

    #[test]
    fn test_loop_detected() {
        let rt = runtime();
        let mut resolver = ImportResolver::new(&rt, &[]);
        resolver.enter_root(Path::new("/project/styles/_vars.scss"));
        let err = resolver.load("vars", Path::new("/project/styles")).unwrap_err();
        assert!(err.starts_with("An @import loop has been found:"), "{err}");
    }
}
