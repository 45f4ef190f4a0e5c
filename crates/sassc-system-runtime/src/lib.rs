/*
 * sassc-system-runtime
 * Copyright (c) 2025 Posit, PBC
 *
 * File access abstraction for the sassc compiler.
 *
 * The import resolver never touches std::fs directly. It goes through a
 * SystemRuntime, so the same compilation can run against:
 *
 * - NativeRuntime: the real filesystem
 * - MemoryRuntime: an in-memory virtual filesystem (tests, embedding)
 */

mod memory;
mod native;
mod traits;

pub use traits::{PathKind, RuntimeError, RuntimeResult, SystemRuntime};

pub use memory::{MemoryRuntime, VirtualFileSystem};
pub use native::NativeRuntime;

/// Create the default runtime for the current platform.
pub fn default_runtime() -> NativeRuntime {
    NativeRuntime::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_runtime_has_cwd() {
        let rt = default_runtime();
        let cwd = rt.cwd().unwrap();
        assert!(cwd.is_absolute());
    }

    #[test]
    fn test_runtimes_are_object_safe() {
        let runtimes: Vec<Box<dyn SystemRuntime>> =
            vec![Box::new(NativeRuntime::new()), Box::new(MemoryRuntime::new())];
        for rt in &runtimes {
            assert!(!rt.is_file(std::path::Path::new("/definitely/not/here.scss")).unwrap());
        }
    }
}
