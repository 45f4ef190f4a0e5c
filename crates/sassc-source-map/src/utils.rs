//! Path helpers
//!
//! Copyright (c) 2025 Posit, PBC

use std::path::{Component, Path, PathBuf};

/// Path of `target` relative to the directory `base`.
///
/// Both paths are compared component by component after dropping `.`
/// segments; no filesystem access happens. If the paths share no root
/// (for example different Windows drives) `target` is returned unchanged.
///
/// ```
/// use std::path::{Path, PathBuf};
/// use sassc_source_map::relative_path;
///
/// assert_eq!(
///     relative_path(Path::new("/a/b"), Path::new("/a/c/d.scss")),
///     PathBuf::from("../c/d.scss")
/// );
/// ```
pub fn relative_path(base: &Path, target: &Path) -> PathBuf {
    let base: Vec<Component> = base
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let target_components: Vec<Component> = target
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    if base.first() != target_components.first() {
        return target.to_path_buf();
    }

    let common = base
        .iter()
        .zip(target_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in common..base.len() {
        result.push("..");
    }
    for component in &target_components[common..] {
        result.push(component.as_os_str());
    }
    if result.as_os_str().is_empty() {
        result.push(".");
    }
    result
}
